#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ENTRYPOINT_TEMPLATE: &str = "package main\n\nfunc run() error {\n\t$services\n\treturn nil\n}\n";

pub const USERS_GATEWAY: &str = "package users\n\n\
func RegisterUserServiceHandlerFromEndpoint(ctx context.Context, mux *runtime.ServeMux, endpoint string, opts []grpc.DialOption) (err error) {\n\
\treturn RegisterUserServiceHandler(ctx, mux, conn)\n\
}\n";

pub const ADMIN_GATEWAY: &str = "package admin\n\n\
func RegisterAdminServiceHandlerFromEndpoint(ctx context.Context, mux *runtime.ServeMux, endpoint string, opts []grpc.DialOption) (err error) {\n\
\treturn nil\n\
}\n\
// see also RegisterUserServiceHandlerFromEndpoint\n";

pub fn get_protogate_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.join("protogate")
}

/// Repository with a Dockerfile, an entrypoint template and two proto folders
/// (`protos/svc1`, `protos/svc2`)
pub fn sample_repo() -> TempDir {
    let repo = TempDir::new().unwrap();
    let root = repo.path();

    write(root, "Dockerfile", "FROM golang:1.22\nARG project\nCOPY ${project} /src\n");
    write(root, "template/main.go.template", ENTRYPOINT_TEMPLATE);
    write(root, "template/buf.gen.yaml", "version: v1\n");
    write(root, "protos/svc1/users.proto", "syntax = \"proto3\";\npackage users;\n");
    write(root, "protos/svc2/orders.proto", "syntax = \"proto3\";\npackage orders;\n");
    repo
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
