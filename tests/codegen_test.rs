//! Extraction feeding synthesis through the public API

mod support;

use protogate::codegen::{EntrypointSynthesizer, EntrypointTemplate, ServiceExtractor};
use support::{write, ADMIN_GATEWAY, ENTRYPOINT_TEMPLATE, USERS_GATEWAY};
use tempfile::TempDir;

#[test]
fn test_generated_sources_to_entrypoint() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "users/v1/users.pb.gw.go", USERS_GATEWAY);
    write(dir.path(), "admin/v1/admin.pb.gw.go", ADMIN_GATEWAY);
    let files = vec![
        dir.path().join("users/v1/users.pb.gw.go"),
        dir.path().join("admin/v1/admin.pb.gw.go"),
    ];

    let services = ServiceExtractor::new().extract(&files).unwrap();
    assert_eq!(services.len(), 2);

    let template = EntrypointTemplate::parse(ENTRYPOINT_TEMPLATE).unwrap();
    let program = EntrypointSynthesizer::new(template).synthesize(&services);

    let expected = "package main\n\nfunc run() error {\n\
\terr := gw.RegisterAdminServiceHandlerFromEndpoint(ctx, mux, *flag.String(\"adminservice\", grpcEndpoint, \"gRPC server endpoint\"), opts)\n\
\tif err != nil {\n\
\t\treturn err\n\
\t}\n\
\terr = gw.RegisterUserServiceHandlerFromEndpoint(ctx, mux, *flag.String(\"userservice\", grpcEndpoint, \"gRPC server endpoint\"), opts)\n\
\tif err != nil {\n\
\t\treturn err\n\
\t}\n\
\treturn nil\n}\n";
    assert_eq!(program, expected);
}

#[test]
fn test_no_services_leaves_placeholder_line_empty() {
    let template = EntrypointTemplate::parse(ENTRYPOINT_TEMPLATE).unwrap();
    let services = ServiceExtractor::new().extract::<&str>(&[]).unwrap();

    let program = EntrypointSynthesizer::new(template).synthesize(&services);
    assert_eq!(program, "package main\n\nfunc run() error {\n\t\n\treturn nil\n}\n");
}
