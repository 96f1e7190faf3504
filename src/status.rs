//! Container status classification.
//!
//! mailcow names its containers after the compose project, e.g.
//! `mailcowdockerized-postfix-mailcow-1`. A container is attributed to a
//! service by searching its name for a known token.

/// A mailcow service that has its own `*_up` gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    Rspamd,
    Netfilter,
    Postfix,
    Dovecot,
    Mysql,
    Acme,
    Nginx,
    PhpFpm,
    Solr,
    Api,
    Olefy,
    Clamd,
    Redis,
    Watchdog,
    Sogo,
    Memcached,
    Unbound,
}

/// Container name tokens in match priority order.
///
/// Matching is first-hit, so the order decides the winner for names that
/// contain more than one token.
pub const SERVICE_TOKENS: [(&str, ServiceKind); 17] = [
    ("rspamd", ServiceKind::Rspamd),
    ("netfilter", ServiceKind::Netfilter),
    ("postfix", ServiceKind::Postfix),
    ("dovecot", ServiceKind::Dovecot),
    ("mysql", ServiceKind::Mysql),
    ("acme", ServiceKind::Acme),
    ("nginx", ServiceKind::Nginx),
    ("php", ServiceKind::PhpFpm),
    ("solr", ServiceKind::Solr),
    ("api", ServiceKind::Api),
    ("olefy", ServiceKind::Olefy),
    ("clamd", ServiceKind::Clamd),
    ("redis", ServiceKind::Redis),
    ("watchdog", ServiceKind::Watchdog),
    ("sogo", ServiceKind::Sogo),
    ("memcached", ServiceKind::Memcached),
    ("unbound", ServiceKind::Unbound),
];

impl ServiceKind {
    /// Every service, in token-table order.
    pub fn all() -> impl Iterator<Item = ServiceKind> {
        SERVICE_TOKENS.iter().map(|(_, kind)| *kind)
    }

    /// The name of this service's `up` gauge.
    pub fn metric_name(self) -> &'static str {
        match self {
            ServiceKind::Rspamd => "mailcow_container_rspamd_up",
            ServiceKind::Netfilter => "mailcow_container_netfilter_up",
            ServiceKind::Postfix => "mailcow_container_postfix_up",
            ServiceKind::Dovecot => "mailcow_container_dovecot_up",
            ServiceKind::Mysql => "mailcow_container_mysql_up",
            ServiceKind::Acme => "mailcow_container_acme_up",
            ServiceKind::Nginx => "mailcow_container_nginx_up",
            ServiceKind::PhpFpm => "mailcow_container_php_fpm_up",
            ServiceKind::Solr => "mailcow_container_solr_up",
            ServiceKind::Api => "mailcow_container_api_up",
            ServiceKind::Olefy => "mailcow_container_olefy_up",
            ServiceKind::Clamd => "mailcow_container_clamd_up",
            ServiceKind::Redis => "mailcow_container_redis_up",
            ServiceKind::Watchdog => "mailcow_container_watchdog_up",
            ServiceKind::Sogo => "mailcow_container_sogo_up",
            ServiceKind::Memcached => "mailcow_container_memcached_up",
            ServiceKind::Unbound => "mailcow_container_unbound_up",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            ServiceKind::Rspamd => "Shows if rspamd container is up",
            ServiceKind::Netfilter => "Shows if netfilter container is up",
            ServiceKind::Postfix => "Shows if postfix container is up",
            ServiceKind::Dovecot => "Shows if dovecot container is up",
            ServiceKind::Mysql => "Shows if mysql container is up",
            ServiceKind::Acme => "Shows if acme container is up",
            ServiceKind::Nginx => "Shows if nginx container is up",
            ServiceKind::PhpFpm => "Shows if php fpm container is up",
            ServiceKind::Solr => "Shows if solr container is up",
            ServiceKind::Api => "Shows if api container is up",
            ServiceKind::Olefy => "Shows if olefy container is up",
            ServiceKind::Clamd => "Shows if clamd container is up",
            ServiceKind::Redis => "Shows if redis container is up",
            ServiceKind::Watchdog => "Shows if watchdog container is up",
            ServiceKind::Sogo => "Shows if sogo container is up",
            ServiceKind::Memcached => "Shows if memcached container is up",
            ServiceKind::Unbound => "Shows if unbound container is up",
        }
    }
}

/// Whether a container is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Down = 0,
    Up = 1,
}

impl ServiceStatus {
    pub fn as_gauge_value(self) -> f64 {
        self as u8 as f64
    }
}

/// Classifies a raw container state. Only `running` (any case) is up.
pub fn classify_state(state: &str) -> ServiceStatus {
    if state.eq_ignore_ascii_case("running") {
        ServiceStatus::Up
    } else {
        ServiceStatus::Down
    }
}

/// Finds the service a container belongs to by case-sensitive substring
/// search over [`SERVICE_TOKENS`], returning the first hit.
pub fn match_container_key(name: &str) -> Option<ServiceKind> {
    SERVICE_TOKENS
        .iter()
        .find(|(token, _)| name.contains(*token))
        .map(|(_, kind)| *kind)
}
