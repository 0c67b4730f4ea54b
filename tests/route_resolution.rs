use std::sync::Arc;

use hyper::{Method, StatusCode};
use wicket::{
    GatewayService,
    config::{GatewayConfig, MethodSpec, RouteEntry},
    core::{ConfigError, GatewayError},
};

fn gateway(routes: Vec<RouteEntry>) -> Result<GatewayService, ConfigError> {
    let mut builder = GatewayConfig::builder()
        .app_host("127.0.0.1")
        .app_port(8080)
        .auth_service("auth-go")
        .service("auth-go", "auth-go", 3000)
        .service("email", "email-service", 3001)
        .service("files", "file-store", 9000);
    for route in routes {
        builder = builder.route(route);
    }
    GatewayService::new(Arc::new(builder.build().unwrap()))
}

fn status_of(err: GatewayError) -> StatusCode {
    err.status_code()
}

#[test]
fn test_exact_routes_are_method_specific() {
    let gateway = gateway(vec![
        RouteEntry::new("POST", "/auth/api/v1/login", "auth-go", "/login").public(),
        RouteEntry::new("GET", "/auth/api/v1/login", "auth-go", "/login/form").public(),
    ])
    .unwrap();

    let post = gateway.resolve(&Method::POST, "/auth/api/v1/login").unwrap();
    assert_eq!(post.target_path, "/login");
    assert!(!post.route.auth_required);

    let get = gateway.resolve(&Method::GET, "/auth/api/v1/login").unwrap();
    assert_eq!(get.target_path, "/login/form");

    let err = gateway
        .resolve(&Method::DELETE, "/auth/api/v1/login")
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

#[test]
fn test_paths_match_exactly() {
    let gateway = gateway(vec![RouteEntry::new(
        "POST",
        "/email/api/v1/send",
        "email",
        "/api/v1/send",
    )])
    .unwrap();

    for path in ["/email/api/v1/send/", "/email/api/v1", "/EMAIL/api/v1/send"] {
        let err = gateway.resolve(&Method::POST, path).unwrap_err();
        assert!(
            matches!(err, GatewayError::RouteNotFound { .. }),
            "{path} should not match"
        );
    }
}

#[test]
fn test_longest_prefix_wins() {
    let gateway = gateway(vec![
        RouteEntry::new("GET", "/files/*", "files", "*"),
        RouteEntry::new("GET", "/files/private/*", "auth-go", "/vault/*"),
        RouteEntry::new("GET", "/files/readme", "email", "/readme"),
    ])
    .unwrap();

    let matched = gateway.resolve(&Method::GET, "/files/a/b.txt").unwrap();
    assert_eq!(matched.route.service_name, "files");
    assert_eq!(matched.target_path, "/a/b.txt");

    let matched = gateway
        .resolve(&Method::GET, "/files/private/key.pem")
        .unwrap();
    assert_eq!(matched.route.service_name, "auth-go");
    assert_eq!(matched.target_path, "/vault/key.pem");

    // Exact routes take precedence over any prefix.
    let matched = gateway.resolve(&Method::GET, "/files/readme").unwrap();
    assert_eq!(matched.route.service_name, "email");

    let matched = gateway.resolve(&Method::GET, "/files").unwrap();
    assert_eq!(matched.target_path, "/");

    assert!(gateway.resolve(&Method::GET, "/filesystem").is_err());
}

#[test]
fn test_method_lists_expand_to_routes() {
    let gateway = gateway(vec![RouteEntry::new(
        MethodSpec::Many(vec!["GET".into(), "HEAD".into()]),
        "/status",
        "email",
        "/status",
    )])
    .unwrap();

    assert_eq!(gateway.routes().len(), 2);
    assert!(gateway.resolve(&Method::HEAD, "/status").is_ok());
    assert!(gateway.resolve(&Method::GET, "/status").is_ok());
}

#[test]
fn test_malformed_paths_are_bad_requests() {
    let gateway = gateway(vec![RouteEntry::new("GET", "/files/*", "files", "*")]).unwrap();

    for path in ["/files/../etc/passwd", "/files/./a", "files/a"] {
        let err = gateway.resolve(&Method::GET, path).unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST, "{path}");
    }
}

#[test]
fn test_startup_rejects_broken_tables() {
    let duplicate = gateway(vec![
        RouteEntry::new("GET", "/x", "email", "/a"),
        RouteEntry::new(MethodSpec::Many(vec!["POST".into(), "GET".into()]), "/x", "email", "/b"),
    ]);
    assert!(matches!(duplicate, Err(ConfigError::DuplicateRoute { .. })));

    let unknown = gateway(vec![RouteEntry::new("GET", "/x", "billing", "/a")]);
    assert!(matches!(unknown, Err(ConfigError::UnknownService { .. })));

    let lowercase = gateway(vec![RouteEntry::new("get", "/x", "email", "/a")]);
    assert!(matches!(lowercase, Err(ConfigError::InvalidMethod(_))));

    let misplaced_wildcard = gateway(vec![RouteEntry::new("GET", "/x/*/y", "email", "/a")]);
    assert!(matches!(
        misplaced_wildcard,
        Err(ConfigError::InvalidPath { .. })
    ));
}
