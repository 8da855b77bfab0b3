//! # Header Store Persistence
//!
//! A session restarted on the same file-backed store resumes from the
//! stored tip instead of walking the whole chain again.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use lc_header_store::{FileBackedKVStore, HeaderStore, KvHeaderStore, StoreError};
    use lc_light_client::testing::ChainBuilder;
    use lc_light_client::{ClientSession, LightClientConfig, MockFullNode, SyncState};
    use tempfile::tempdir;

    type FileSession = ClientSession<MockFullNode, KvHeaderStore<FileBackedKVStore>>;

    const MINER: [u8; 32] = [0xee; 32];

    fn open_session(node: &Arc<MockFullNode>, path: &Path) -> FileSession {
        let store = KvHeaderStore::new(FileBackedKVStore::open(path).unwrap());
        ClientSession::new(
            LightClientConfig {
                header_db_path: path.to_path_buf(),
                ..LightClientConfig::for_testing()
            },
            Arc::clone(node),
            Arc::new(store),
        )
    }

    #[tokio::test]
    async fn test_restart_resumes_from_stored_tip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client.db");
        let node = Arc::new(MockFullNode::new());
        let mut builder = ChainBuilder::new(Arc::clone(&node));
        builder.push_empty(6, MINER);

        {
            let session = open_session(&node, &path);
            session.synchronizer().initial_sync().await.unwrap();
            assert_eq!(session.tip().unwrap().height, 6);
        }

        builder.push_empty(2, MINER);
        let fetches_before = node.header_fetches();

        let session = open_session(&node, &path);
        session.synchronizer().initial_sync().await.unwrap();
        assert_eq!(session.sync_state(), SyncState::UpToDate);
        assert_eq!(session.tip().unwrap().height, 8);

        // Tip, H8 and H7 come from the node; H6 is found in the store.
        assert!(node.header_fetches() - fetches_before <= 3);
    }

    #[tokio::test]
    async fn test_restart_keeps_last_header_slot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client.db");
        let node = Arc::new(MockFullNode::new());
        let mut builder = ChainBuilder::new(Arc::clone(&node));
        builder.push_empty(3, MINER);
        let tip = builder.tip().unwrap().hash;

        {
            let session = open_session(&node, &path);
            session.synchronizer().initial_sync().await.unwrap();
        }

        let store = KvHeaderStore::new(FileBackedKVStore::open(&path).unwrap());
        let last = store.get_last().unwrap().unwrap();
        assert_eq!(lc_types::decode::<lc_types::BlockHeader>(&last).unwrap().hash, tip);
    }

    #[test]
    fn test_second_open_is_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client.db");
        let _held = FileBackedKVStore::open(&path).unwrap();
        assert!(matches!(
            FileBackedKVStore::open(&path),
            Err(StoreError::Locked { .. })
        ));
    }
}
