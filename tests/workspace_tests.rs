use companysim::workspace::{FsProvisioner, WorkspaceError, WorkspaceLayout, WorkspaceProvisioner};
use tempfile::TempDir;

#[tokio::test]
async fn test_provision_creates_directory() {
    let temp = TempDir::new().unwrap();
    let layout = WorkspaceLayout::new(temp.path(), "20250101_000000");
    let path = layout.path_for("Engineer");

    assert!(!path.exists());
    let workspace = FsProvisioner.provision(&path).await.unwrap();

    assert!(path.is_dir());
    assert_eq!(workspace.root(), path.canonicalize().unwrap());
}

#[tokio::test]
async fn test_provision_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("run").join("QA");

    let first = FsProvisioner.provision(&path).await.unwrap();
    first.write_file("keep.txt", "still here").await.unwrap();

    let second = FsProvisioner.provision(&path).await.unwrap();
    assert_eq!(first.root(), second.root());
    assert_eq!(second.read_file("keep.txt").await.unwrap(), "still here");
}

#[tokio::test]
async fn test_write_read_and_list() {
    let temp = TempDir::new().unwrap();
    let workspace = FsProvisioner.provision(temp.path()).await.unwrap();

    workspace.write_file("src/main.rs", "fn main() {}").await.unwrap();
    workspace.write_file("README.md", "# demo").await.unwrap();

    assert_eq!(workspace.read_file("src/main.rs").await.unwrap(), "fn main() {}");
    assert_eq!(
        workspace.list_files(".").await.unwrap(),
        vec!["README.md".to_string(), "src".to_string()]
    );
    assert_eq!(
        workspace.list_files("src").await.unwrap(),
        vec!["main.rs".to_string()]
    );
}

#[tokio::test]
async fn test_write_overwrites() {
    let temp = TempDir::new().unwrap();
    let workspace = FsProvisioner.provision(temp.path()).await.unwrap();

    workspace.write_file("plan.md", "v1").await.unwrap();
    workspace.write_file("plan.md", "v2").await.unwrap();
    assert_eq!(workspace.read_file("plan.md").await.unwrap(), "v2");
}

#[tokio::test]
async fn test_paths_cannot_escape_root() {
    let temp = TempDir::new().unwrap();
    let workspace = FsProvisioner
        .provision(&temp.path().join("inner"))
        .await
        .unwrap();

    assert!(matches!(
        workspace.resolve("../outside.txt"),
        Err(WorkspaceError::PathTraversal(_))
    ));
    assert!(matches!(
        workspace.write_file("a/../../outside.txt", "x").await,
        Err(WorkspaceError::PathTraversal(_))
    ));
    assert!(matches!(
        workspace.resolve("/etc/passwd"),
        Err(WorkspaceError::InvalidPath(_))
    ));
    assert!(!temp.path().join("outside.txt").exists());

    // Staying inside after a `..` is fine.
    let resolved = workspace.resolve("docs/../notes.txt").unwrap();
    assert_eq!(resolved, workspace.root().join("notes.txt"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escape_is_rejected() {
    let temp = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let workspace = FsProvisioner
        .provision(&temp.path().join("ws"))
        .await
        .unwrap();

    std::os::unix::fs::symlink(outside.path(), workspace.root().join("link")).unwrap();

    assert!(matches!(
        workspace.write_file("link/secret.txt", "x").await,
        Err(WorkspaceError::PathTraversal(_))
    ));
}

#[tokio::test]
async fn test_read_errors() {
    let temp = TempDir::new().unwrap();
    let workspace = FsProvisioner.provision(temp.path()).await.unwrap();
    workspace.write_file("dir/file.txt", "x").await.unwrap();

    assert!(matches!(
        workspace.read_file("missing.txt").await,
        Err(WorkspaceError::NotFound(_))
    ));
    assert!(matches!(
        workspace.read_file("dir").await,
        Err(WorkspaceError::IsDirectory(_))
    ));
}

#[test]
fn test_layout_keeps_roles_apart() {
    let layout = WorkspaceLayout::new("root", "run7");

    assert_eq!(layout.run_dir(), std::path::PathBuf::from("root/run7"));
    assert_ne!(layout.path_for("Dev/Ops"), layout.path_for("Dev"));
    assert_eq!(layout.path_for("Dev/Ops").parent(), Some(layout.run_dir().as_path()));
    assert_eq!(layout.path_for(".."), layout.run_dir().join("__"));
    assert_eq!(layout.path_for("  "), layout.run_dir().join("unnamed"));
}
