//! # Session Scenarios
//!
//! Whole-session flows over the in-memory node:
//!
//! 1. **Transfer replay**: a funded account sends a transfer, both sides
//!    are reconstructed from the synchronized chain
//! 2. **Fork switch**: a competing tip replaces the local one and its
//!    effects disappear from the projection
//! 3. **Root account**: the genesis credit is never debited
//! 4. **Pending transactions**: a staged transaction is consumed once

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lc_header_store::{InMemoryKVStore, KvHeaderStore};
    use lc_light_client::testing::{funds_tx, make_address, ChainBuilder};
    use lc_light_client::{
        AnnouncementOutcome, BroadcastTarget, ClientSession, FinalizeOutcome, LightClientApi,
        LightClientConfig, LightClientError, MockFullNode, SyncState, TxStatus,
    };
    use lc_types::{address_hash, Account, Address, Hash, Transaction};

    type TestSession = ClientSession<MockFullNode, KvHeaderStore<InMemoryKVStore>>;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const MINER: Hash = [0xee; 32];

    fn create_session(node: &Arc<MockFullNode>) -> TestSession {
        ClientSession::new(
            LightClientConfig::for_testing(),
            Arc::clone(node),
            Arc::new(KvHeaderStore::new(InMemoryKVStore::new())),
        )
    }

    fn register(node: &MockFullNode, address: Address) -> Hash {
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
        hash
    }

    fn register_root(node: &MockFullNode, address: Address) -> Hash {
        let hash = address_hash(&address);
        node.insert_root_account(
            hash,
            Account {
                address,
                balance: 0,
                tx_cnt: 0,
                is_staking: false,
            },
        );
        hash
    }

    /// Root funds `alice` with 100 in block 1.
    fn funded_chain(node: &Arc<MockFullNode>) -> (ChainBuilder, Address, Hash) {
        let root = register_root(node, make_address(1));
        let alice = make_address(2);
        let alice_hash = register(node, alice);

        let mut builder = ChainBuilder::new(Arc::clone(node));
        builder
            .push_block(
                MINER,
                vec![Transaction::Funds(funds_tx(root, alice_hash, 100, 1, 0))],
            )
            .unwrap();
        (builder, alice, alice_hash)
    }

    // =============================================================================
    // TRANSFER REPLAY
    // =============================================================================

    #[tokio::test]
    async fn test_simple_transfer_both_sides() {
        let node = Arc::new(MockFullNode::new());
        let (mut builder, alice, alice_hash) = funded_chain(&node);
        let bob = make_address(3);
        let bob_hash = address_hash(&bob);
        let transfer = funds_tx(alice_hash, bob_hash, 10, 1, 0);
        builder
            .push_block(MINER, vec![Transaction::Funds(transfer.clone())])
            .unwrap();

        let session = create_session(&node);
        session.synchronizer().initial_sync().await.unwrap();
        assert_eq!(session.sync_state(), SyncState::UpToDate);
        assert_eq!(session.tip().unwrap().height, 2);

        let (sender, _) = session.query_account(&alice).await.unwrap();
        assert_eq!(sender.balance, 89);
        assert_eq!(sender.tx_cnt, 1);
        assert!(sender.is_created);
        assert!(!sender.is_root);

        // Bob is unknown to the node but the chain credits him.
        let (recipient, recent) = session.query_account(&bob).await.unwrap();
        assert_eq!(recipient.balance, 10);
        assert_eq!(recipient.tx_cnt, 0);
        assert!(recipient.is_created);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].hash, transfer.hash());
        assert_eq!(recent[0].status, TxStatus::Verified);
    }

    #[tokio::test]
    async fn test_replay_is_deterministic() {
        let node = Arc::new(MockFullNode::new());
        let (mut builder, alice, alice_hash) = funded_chain(&node);
        for i in 0..4u32 {
            builder
                .push_block(
                    MINER,
                    vec![Transaction::Funds(funds_tx(
                        alice_hash,
                        [0x40 + i as u8; 32],
                        5,
                        1,
                        i,
                    ))],
                )
                .unwrap();
        }

        let session = create_session(&node);
        session.synchronizer().initial_sync().await.unwrap();

        let first = session.query_account(&alice).await.unwrap();
        let second = session.query_account(&alice).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.0.balance, 100 - 4 * 6);
        assert_eq!(first.0.tx_cnt, 4);
    }

    #[tokio::test]
    async fn test_unknown_untouched_account() {
        let node = Arc::new(MockFullNode::new());
        let (_builder, _alice, _) = funded_chain(&node);

        let session = create_session(&node);
        session.synchronizer().initial_sync().await.unwrap();

        let stranger = make_address(99);
        assert!(matches!(
            session.query_account(&stranger).await,
            Err(LightClientError::AccountNotFound(hash)) if hash == address_hash(&stranger)
        ));
    }

    // =============================================================================
    // FORK SWITCH
    // =============================================================================

    #[tokio::test]
    async fn test_fork_switch_at_tip() {
        let node = Arc::new(MockFullNode::new());
        let (mut builder, alice, alice_hash) = funded_chain(&node);
        builder.push_empty(8, MINER);
        // H10 on the first branch pays alice another 50.
        builder
            .push_block(
                MINER,
                vec![Transaction::Funds(funds_tx([0x33; 32], alice_hash, 50, 1, 0))],
            )
            .unwrap();
        assert_eq!(builder.headers().len(), 10);

        let session = create_session(&node);
        session.synchronizer().initial_sync().await.unwrap();
        let (before, _) = session.query_account(&alice).await.unwrap();
        assert_eq!(before.balance, 150);

        // H10' shares H1..H9 and carries nothing for alice.
        let mut fork = builder.fork_at(9);
        fork.push_empty(1, MINER);
        let fork_tip = fork.tip().unwrap().clone();

        let outcome = session
            .synchronizer()
            .on_announcement(fork_tip.clone())
            .await
            .unwrap();
        assert_eq!(outcome, AnnouncementOutcome::Reconciled);

        let chain = session.synchronizer().chain();
        {
            let chain = chain.read();
            assert_eq!(chain.len(), 10);
            assert_eq!(chain.tip_header().unwrap().hash, fork_tip.hash);
            let h9 = builder.headers()[8].hash;
            let copies = chain.headers().iter().filter(|h| h.hash == h9).count();
            assert_eq!(copies, 1);
            assert!(!chain.contains(&builder.tip().unwrap().hash));
        }

        let (after, _) = session.query_account(&alice).await.unwrap();
        assert_eq!(after.balance, 100);
    }

    #[tokio::test]
    async fn test_longer_fork_replaces_tail() {
        let node = Arc::new(MockFullNode::new());
        let mut builder = ChainBuilder::new(Arc::clone(&node));
        builder.push_empty(6, MINER);

        let session = create_session(&node);
        session.synchronizer().initial_sync().await.unwrap();

        let mut fork = builder.fork_at(4);
        fork.push_empty(4, MINER);

        session
            .synchronizer()
            .on_announcement(fork.tip().unwrap().clone())
            .await
            .unwrap();

        let chain = session.synchronizer().chain();
        let chain = chain.read();
        let hashes: Vec<Hash> = chain.headers().iter().map(|h| h.hash).collect();
        let expected: Vec<Hash> = fork.headers().iter().map(|h| h.hash).collect();
        assert_eq!(hashes, expected);
    }

    // =============================================================================
    // ROOT ACCOUNT
    // =============================================================================

    #[tokio::test]
    async fn test_root_is_never_debited() {
        let node = Arc::new(MockFullNode::new());
        let root = make_address(1);
        let (_builder, _, _) = funded_chain(&node);

        let session = create_session(&node);
        session.synchronizer().initial_sync().await.unwrap();

        let (projection, _) = session.query_account(&root).await.unwrap();
        assert!(projection.is_root);
        assert!(projection.is_created);
        assert_eq!(
            projection.balance,
            LightClientConfig::for_testing().root_initial_balance
        );
        assert_eq!(projection.tx_cnt, 1);
    }

    // =============================================================================
    // PENDING TRANSACTIONS
    // =============================================================================

    #[tokio::test]
    async fn test_pending_tx_consumed_once() {
        let node = Arc::new(MockFullNode::new());
        let session = create_session(&node);

        let tx = session
            .construct_acc_tx(0, 1, [1u8; 32], make_address(5))
            .unwrap();
        let hash = session.stage(tx.clone());
        assert_eq!(hash, tx.hash());

        let (first, second) = tokio::join!(
            session.finalize(hash, [7u8; 64]),
            session.finalize(hash, [8u8; 64])
        );
        let outcomes = [first, second];
        let broadcast = outcomes
            .iter()
            .filter(|r| matches!(r, Ok(FinalizeOutcome::Broadcast)))
            .count();
        let stale = outcomes
            .iter()
            .filter(|r| matches!(r, Err(LightClientError::StaleOrMissingPendingTx(_))))
            .count();
        assert_eq!((broadcast, stale), (1, 1));
        assert_eq!(session.staged(), 0);
        assert_eq!(node.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn test_cosigned_transfer_two_steps() {
        let node = Arc::new(MockFullNode::new());
        let session = create_session(&node);

        let tx = session
            .construct_funds_tx(0, 10, 1, 0, [1u8; 32], [2u8; 32])
            .unwrap();
        let hash = session.stage(tx);

        assert_eq!(
            session.finalize(hash, [7u8; 64]).await.unwrap(),
            FinalizeOutcome::AwaitingCosign
        );
        assert_eq!(session.staged(), 1);
        assert_eq!(
            session.finalize(hash, [8u8; 64]).await.unwrap(),
            FinalizeOutcome::Broadcast
        );

        let broadcasts = node.broadcasts();
        assert_eq!(broadcasts.len(), 2);
        assert_eq!(broadcasts[0].0, BroadcastTarget::CoSigner);
        assert_eq!(broadcasts[1].0, BroadcastTarget::Bootstrap);
        match &broadcasts[1].1 {
            Transaction::Funds(funds) => {
                assert_eq!(funds.sig1, [7u8; 64]);
                assert_eq!(funds.sig2, [8u8; 64]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_broadcast_consumes_entry() {
        let node = Arc::new(MockFullNode::new());
        node.set_broadcast_failure(true);
        let session = create_session(&node);

        let tx = session
            .construct_stake_tx(0, 1, true, [3u8; 32], [4u8; 32])
            .unwrap();
        let hash = session.stage(tx);

        assert!(session.finalize(hash, [1u8; 64]).await.is_err());
        assert!(matches!(
            session.finalize(hash, [1u8; 64]).await,
            Err(LightClientError::StaleOrMissingPendingTx(_))
        ));
    }
}
