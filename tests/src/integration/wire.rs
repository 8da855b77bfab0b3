//! # Wire Scenarios
//!
//! A [`lc_light_client::ClientSession`] over a real [`NetworkClient`]
//! talking to the loopback node. Covers the handshake, header and block
//! fetches, account lookups, Merkle paths, co-signer queries, broadcasts
//! and pushed header announcements.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use lc_header_store::{InMemoryKVStore, KvHeaderStore};
    use lc_light_client::testing::{funds_tx, make_address, ChainBuilder};
    use lc_light_client::{
        ClientSession, FinalizeOutcome, LightClientApi, LightClientConfig, MockFullNode,
        NetworkClient, SyncState, TxStatus,
    };
    use lc_types::{address_hash, Account, Hash, Transaction};
    use tokio::sync::watch;

    use crate::support::StubFullNode;

    type WireSession = ClientSession<NetworkClient, KvHeaderStore<InMemoryKVStore>>;

    const MINER: Hash = [0xee; 32];

    fn wire_config(stub: &StubFullNode) -> LightClientConfig {
        LightClientConfig {
            bootstrap_addr: stub.addr().to_string(),
            cosigning_addr: stub.addr().to_string(),
            fetch_timeout: Duration::from_millis(500),
            ..LightClientConfig::for_testing()
        }
    }

    async fn connect_session(stub: &StubFullNode) -> WireSession {
        let config = wire_config(stub);
        let client = NetworkClient::new(config.clone());
        client.connect(stub.addr()).await.unwrap();
        ClientSession::new(
            config,
            Arc::new(client),
            Arc::new(KvHeaderStore::new(InMemoryKVStore::new())),
        )
    }

    fn register(node: &MockFullNode, n: u8) -> (lc_types::Address, Hash) {
        let address = make_address(n);
        let hash = address_hash(&address);
        node.insert_account(
            hash,
            Account {
                address,
                balance: 0,
                tx_cnt: 0,
                is_staking: false,
            },
        );
        (address, hash)
    }

    #[tokio::test]
    async fn test_sync_and_query_over_tcp() {
        let node = Arc::new(MockFullNode::new());
        let (alice, alice_hash) = register(&node, 2);
        let mut builder = ChainBuilder::new(Arc::clone(&node));
        builder.push_empty(2, MINER);
        builder
            .push_block(
                MINER,
                vec![Transaction::Funds(funds_tx([0x11; 32], alice_hash, 40, 1, 0))],
            )
            .unwrap();
        builder
            .push_block(
                MINER,
                vec![Transaction::Funds(funds_tx(alice_hash, [0x22; 32], 15, 2, 0))],
            )
            .unwrap();

        let stub = StubFullNode::spawn(Arc::clone(&node)).await.unwrap();
        let session = connect_session(&stub).await;

        session.synchronizer().initial_sync().await.unwrap();
        assert_eq!(session.sync_state(), SyncState::UpToDate);
        assert_eq!(session.tip().unwrap().hash, builder.tip().unwrap().hash);

        let (projection, recent) = session.query_account(&alice).await.unwrap();
        assert_eq!(projection.balance, 40 - 17);
        assert_eq!(projection.tx_cnt, 1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].status, TxStatus::Verified);
    }

    #[tokio::test]
    async fn test_non_verified_transfer_over_tcp() {
        let node = Arc::new(MockFullNode::new());
        let (alice, alice_hash) = register(&node, 2);
        let mut builder = ChainBuilder::new(Arc::clone(&node));
        builder.push_empty(1, MINER);
        let pending = funds_tx([0x11; 32], alice_hash, 9, 1, 4);
        node.insert_non_verified(alice_hash, pending.clone());

        let stub = StubFullNode::spawn(Arc::clone(&node)).await.unwrap();
        let session = connect_session(&stub).await;
        session.synchronizer().initial_sync().await.unwrap();

        let (projection, recent) = session.query_account(&alice).await.unwrap();
        assert_eq!(projection.balance, 0);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].hash, pending.hash());
        assert_eq!(recent[0].status, TxStatus::NotVerified);
    }

    #[tokio::test]
    async fn test_announcement_extends_chain() {
        let node = Arc::new(MockFullNode::new());
        let mut builder = ChainBuilder::new(Arc::clone(&node));
        builder.push_empty(3, MINER);

        let stub = StubFullNode::spawn(Arc::clone(&node)).await.unwrap();
        let session = connect_session(&stub).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let listener = tokio::spawn(session.synchronizer().run(shutdown_rx));

        let synced = tokio::time::timeout(Duration::from_secs(5), async {
            while session.sync_state() != SyncState::UpToDate {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(synced.is_ok());

        builder.push_empty(1, MINER);
        let new_tip = builder.tip().unwrap().clone();
        node.announce(new_tip.clone());

        let followed = tokio::time::timeout(Duration::from_secs(5), async {
            while session.tip().map(|t| t.hash) != Some(new_tip.hash) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(followed.is_ok());
        assert_eq!(session.tip().unwrap().height, 4);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), listener)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_cosigned_broadcast_over_tcp() {
        let node = Arc::new(MockFullNode::new());
        let stub = StubFullNode::spawn(Arc::clone(&node)).await.unwrap();
        let session = connect_session(&stub).await;

        let tx = session
            .construct_funds_tx(0, 10, 1, 0, [1u8; 32], [2u8; 32])
            .unwrap();
        let hash = session.stage(tx);

        assert_eq!(
            session.finalize(hash, [5u8; 64]).await.unwrap(),
            FinalizeOutcome::AwaitingCosign
        );
        assert_eq!(
            session.finalize(hash, [6u8; 64]).await.unwrap(),
            FinalizeOutcome::Broadcast
        );

        let submissions = stub.submissions();
        assert_eq!(submissions.len(), 2);
        assert!(submissions.iter().all(|tx| tx.hash() == hash));
        match &submissions[1] {
            Transaction::Funds(funds) => assert_eq!(funds.sig2, [6u8; 64]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_neighbor_request_answered() {
        let node = Arc::new(MockFullNode::new());
        let stub = StubFullNode::spawn(node).await.unwrap();
        let client = NetworkClient::new(wire_config(&stub));
        client.connect(stub.addr()).await.unwrap();

        let neighbors = client.neighbor_req().await.unwrap();
        assert!(neighbors.is_empty());
    }
}
