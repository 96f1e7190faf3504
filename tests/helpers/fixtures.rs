//! Representative API payloads for a small mailcow installation.

use serde_json::{json, Value};

pub fn containers() -> Value {
    json!({
        "mailcowdockerized-postfix-mailcow-1": { "state": "exited", "container": "postfix-mailcow" },
        "mailcowdockerized-dovecot-mailcow-1": { "state": "running", "container": "dovecot-mailcow" },
        "mailcowdockerized-clamd-mailcow-1": { "state": "exited", "container": "clamd-mailcow" },
        "mailcowdockerized-php-fpm-mailcow-1": { "state": "running", "container": "php-fpm-mailcow" },
        "mailcowdockerized-ofelia-mailcow-1": { "state": "running", "container": "ofelia-mailcow" },
    })
}

pub fn vmail() -> Value {
    json!({ "type": "info", "disk": "/dev/sda1", "used": "4.2GB", "total": "10GB", "used_percent": "42%" })
}

pub fn solr() -> Value {
    json!({ "type": "info", "solr_enabled": true, "solr_size": "25MB", "solr_documents": 1500 })
}

pub fn mailboxes() -> Value {
    json!([
        { "username": "alice@example.com", "messages": 10 },
        { "username": "bob@example.com", "messages": 32 },
        { "username": "carol@example.com" },
    ])
}

/// Every endpoint path paired with a healthy payload.
pub fn healthy() -> Vec<(&'static str, Value)> {
    vec![
        ("status/containers", containers()),
        ("status/vmail", vmail()),
        ("status/solr", solr()),
        ("mailbox/all", mailboxes()),
        ("alias/all", json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }, { "id": 4 }])),
        ("mailq/all", json!([])),
        ("quarantine/all", json!([{ "id": 7 }, { "id": 8 }])),
        ("syncjobs/all/no_log", json!([{ "id": 1 }])),
        ("domain/all", json!([{ "domain_name": "example.com" }, { "domain_name": "example.org" }])),
        ("fwdhost/all", json!([{ "host": "192.0.2.10" }])),
    ]
}
