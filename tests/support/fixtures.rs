//! Test fixtures and constants.

/// Store snapshot shared by most tests.
pub const STORE_YAML: &str = r#"
secret/app:
  user: bob
  pass: hunter2
secret/db:
  password: s3cret
  port: 5432
secret/tls:
  bundle: {"cert": "CERT", "key": "KEY"}
secret/empty:
  blank: ""
  nullish: "null"
salt/pillar_mapping:
  dynamic_config: '{"L@web01": {"dyn": "secret/app?user"}, "*": {"db_password": "secret/app?pass"}}'
"#;

/// Mapping document shared by most tests.
pub const MAPPING_YAML: &str = r#"
"*":
  app: "secret/app"
  db_password: "secret/db?password"
"G@role:web":
  tls:
    cert_bundle: "secret/tls?bundle"
    missing: "secret/tls?nope"
  blank: "secret/empty?blank"
"{{ minion_id }}":
  port: "secret/db?port"
"#;

/// Grains of the standard web minion.
pub const WEB_GRAINS: &str = "role: web\nos: Ubuntu\n";
