//! Built-in system variables.
//!
//! Each variable is a pure function of the request context. The names are
//! kept in a trie built once on first use.

use std::sync::LazyLock;

use crate::expression::context::ExpressionContext;
use crate::expression::trie::VariableTrie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemVariable {
    ContentLength,
    ContentType,
    Host,
    RequestMethod,
    RequestScheme,
    RequestPath,
    RequestPathBase,
    RequestQueryString,
    RequestEncodedUrl,
    RemoteAddress,
    RemotePort,
    ServerAddress,
    ServerPort,
    ServerName,
    ServerProtocol,
}

impl SystemVariable {
    pub const ALL: [SystemVariable; 15] = [
        SystemVariable::ContentLength,
        SystemVariable::ContentType,
        SystemVariable::Host,
        SystemVariable::RequestMethod,
        SystemVariable::RequestScheme,
        SystemVariable::RequestPath,
        SystemVariable::RequestPathBase,
        SystemVariable::RequestQueryString,
        SystemVariable::RequestEncodedUrl,
        SystemVariable::RemoteAddress,
        SystemVariable::RemotePort,
        SystemVariable::ServerAddress,
        SystemVariable::ServerPort,
        SystemVariable::ServerName,
        SystemVariable::ServerProtocol,
    ];

    /// The name used after `$` in expressions.
    pub fn name(self) -> &'static str {
        match self {
            SystemVariable::ContentLength => "content_length",
            SystemVariable::ContentType => "content_type",
            SystemVariable::Host => "host",
            SystemVariable::RequestMethod => "request_method",
            SystemVariable::RequestScheme => "request_scheme",
            SystemVariable::RequestPath => "request_path",
            SystemVariable::RequestPathBase => "request_path_base",
            SystemVariable::RequestQueryString => "request_query_string",
            SystemVariable::RequestEncodedUrl => "request_encoded_url",
            SystemVariable::RemoteAddress => "remote_address",
            SystemVariable::RemotePort => "remote_port",
            SystemVariable::ServerAddress => "server_address",
            SystemVariable::ServerPort => "server_port",
            SystemVariable::ServerName => "server_name",
            SystemVariable::ServerProtocol => "server_protocol",
        }
    }

    /// Append this variable's value for the given request to `out`.
    pub fn write<C: ExpressionContext + ?Sized>(self, context: &C, out: &mut String) {
        match self {
            SystemVariable::ContentLength => {
                if let Some(length) = context.content_length() {
                    out.push_str(&length.to_string());
                }
            }
            SystemVariable::ContentType => out.push_str(context.content_type().unwrap_or_default()),
            SystemVariable::Host => out.push_str(context.host().unwrap_or_default()),
            SystemVariable::RequestMethod => out.push_str(context.method()),
            SystemVariable::RequestScheme => out.push_str(context.scheme()),
            SystemVariable::RequestPath => out.push_str(context.path()),
            SystemVariable::RequestPathBase => out.push_str(context.path_base()),
            SystemVariable::RequestQueryString => write_query_string(context, out),
            SystemVariable::RequestEncodedUrl => {
                out.push_str(context.scheme());
                out.push_str("://");
                out.push_str(context.host().unwrap_or_default());
                out.push_str(context.path_base());
                out.push_str(context.path());
                write_query_string(context, out);
            }
            SystemVariable::RemoteAddress => {
                if let Some(addr) = context.remote_addr() {
                    out.push_str(&addr.ip().to_string());
                }
            }
            SystemVariable::RemotePort => {
                if let Some(addr) = context.remote_addr() {
                    out.push_str(&addr.port().to_string());
                }
            }
            SystemVariable::ServerAddress => {
                if let Some(addr) = context.local_addr() {
                    out.push_str(&addr.ip().to_string());
                }
            }
            SystemVariable::ServerPort => {
                if let Some(addr) = context.local_addr() {
                    out.push_str(&addr.port().to_string());
                }
            }
            SystemVariable::ServerName => out.push_str(server_name()),
            SystemVariable::ServerProtocol => out.push_str(context.protocol()),
        }
    }
}

fn write_query_string<C: ExpressionContext + ?Sized>(context: &C, out: &mut String) {
    if let Some(query) = context.query().filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(query);
    }
}

/// All system variables, keyed by name.
pub fn system_variables() -> &'static VariableTrie<SystemVariable> {
    static TRIE: LazyLock<VariableTrie<SystemVariable>> = LazyLock::new(|| {
        let mut trie = VariableTrie::new();
        for variable in SystemVariable::ALL {
            trie.add(variable.name(), variable);
        }
        trie
    });
    &TRIE
}

/// Host name of the machine running the gateway.
pub fn server_name() -> &'static str {
    static NAME: LazyLock<String> = LazyLock::new(|| {
        std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .ok()
            .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "localhost".to_string())
    });
    &NAME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_variables_registered() {
        let trie = system_variables();
        assert_eq!(trie.len(), SystemVariable::ALL.len());
        for variable in SystemVariable::ALL {
            assert_eq!(trie.get(variable.name()), Some(&variable));
        }
    }

    #[test]
    fn test_prefix_names_resolve_longest() {
        let trie = system_variables();
        assert_eq!(
            trie.get_best_match("request_path_base"),
            Some((&SystemVariable::RequestPathBase, 17))
        );
        assert_eq!(
            trie.get_best_match("request_pathx"),
            Some((&SystemVariable::RequestPath, 12))
        );
    }

    #[test]
    fn test_server_name_is_not_empty() {
        assert!(!server_name().is_empty());
    }
}
