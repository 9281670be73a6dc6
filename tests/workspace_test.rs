use pdfmatrix_backend::services::workspace::Workspace;
use std::collections::HashSet;

#[tokio::test]
async fn test_workspace_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::create(dir.path().join("ws")).await.unwrap();
    assert!(ws.root().is_dir());

    // Allocate a handful of files and materialize them
    let mut staged = Vec::new();
    for _ in 0..8 {
        let file = ws.allocate("docx");
        tokio::fs::write(file.path(), b"content").await.unwrap();
        staged.push(file);
    }
    assert_eq!(std::fs::read_dir(ws.root()).unwrap().count(), 8);

    for file in staged {
        file.release().await;
    }
    assert_eq!(std::fs::read_dir(ws.root()).unwrap().count(), 0);

    ws.teardown().await;
    assert!(!ws.root().exists());
}

#[tokio::test]
async fn test_concurrent_allocations_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::create(dir.path().join("ws")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..128 {
        let ws = ws.clone();
        handles.push(tokio::spawn(async move {
            let staged = ws.allocate("docx");
            tokio::fs::write(staged.path(), b"x").await.unwrap();
            let path = staged.path().to_path_buf();
            staged.release().await;
            path
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        assert!(seen.insert(handle.await.unwrap()));
    }
    assert_eq!(std::fs::read_dir(ws.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_panicking_task_still_cleans_up_staged_file() {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::create(dir.path().join("ws")).await.unwrap();

    let staged = ws.allocate("docx");
    let path = staged.path().to_path_buf();

    let handle = tokio::spawn(async move {
        tokio::fs::write(staged.path(), b"content").await.unwrap();
        panic!("mid-handler fault");
    });

    assert!(handle.await.is_err());
    // Drop ran during unwind and removed the file
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(ws.root()).unwrap().count(), 0);
}
