//! Message type ids. The numeric values are fixed by the node software.

use lc_types::TxKind;

/// Wire message type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum MessageType {
    FundsTxBrdcst = 1,
    AccTxBrdcst = 2,
    ConfigTxBrdcst = 3,
    StakeTxBrdcst = 4,
    VerifiedTxBrdcst = 5,
    BlockBrdcst = 6,
    BlockHeaderBrdcst = 7,
    TxBrdcstAck = 8,
    IotTxBrdcst = 9,

    FundsTxReq = 10,
    AccTxReq = 11,
    ConfigTxReq = 12,
    StakeTxReq = 13,
    BlockReq = 14,
    BlockHeaderReq = 15,
    AccReq = 16,
    RootAccReq = 17,
    IntermediateNodesReq = 18,

    FundsTxRes = 20,
    AccTxRes = 21,
    ConfigTxRes = 22,
    StakeTxRes = 23,
    BlockRes = 24,
    BlockHeaderRes = 25,
    AccRes = 26,
    RootAccRes = 27,
    IntermediateNodesRes = 28,

    NeighborReq = 30,
    NeighborRes = 40,
    TimeBrdcst = 50,

    MinerPing = 100,
    MinerPong = 101,
    ClientPing = 102,
    ClientPong = 103,

    NotFound = 110,
}

impl MessageType {
    /// Raw id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Broadcast type used to submit a transaction of `kind`.
    pub fn broadcast_for(kind: TxKind) -> Self {
        match kind {
            TxKind::Funds => Self::FundsTxBrdcst,
            TxKind::Acc => Self::AccTxBrdcst,
            TxKind::Config => Self::ConfigTxBrdcst,
            TxKind::Stake => Self::StakeTxBrdcst,
            TxKind::Iot => Self::IotTxBrdcst,
        }
    }

    /// Request type used to fetch a transaction of `kind`, if the node serves it.
    pub fn request_for(kind: TxKind) -> Option<Self> {
        match kind {
            TxKind::Funds => Some(Self::FundsTxReq),
            TxKind::Acc => Some(Self::AccTxReq),
            TxKind::Config => Some(Self::ConfigTxReq),
            TxKind::Stake => Some(Self::StakeTxReq),
            TxKind::Iot => None,
        }
    }

    /// Transaction kind carried by a transaction response.
    pub fn response_tx_kind(self) -> Option<TxKind> {
        match self {
            Self::FundsTxRes => Some(TxKind::Funds),
            Self::AccTxRes => Some(TxKind::Acc),
            Self::ConfigTxRes => Some(TxKind::Config),
            Self::StakeTxRes => Some(TxKind::Stake),
            _ => None,
        }
    }

    /// Upper-snake name as used in node logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::FundsTxBrdcst => "FUNDSTX_BRDCST",
            Self::AccTxBrdcst => "ACCTX_BRDCST",
            Self::ConfigTxBrdcst => "CONFIGTX_BRDCST",
            Self::StakeTxBrdcst => "STAKETX_BRDCST",
            Self::VerifiedTxBrdcst => "VERIFIEDTX_BRDCST",
            Self::BlockBrdcst => "BLOCK_BRDCST",
            Self::BlockHeaderBrdcst => "BLOCK_HEADER_BRDCST",
            Self::TxBrdcstAck => "TX_BRDCST_ACK",
            Self::IotTxBrdcst => "IOTTX_BRDCST",
            Self::FundsTxReq => "FUNDSTX_REQ",
            Self::AccTxReq => "ACCTX_REQ",
            Self::ConfigTxReq => "CONFIGTX_REQ",
            Self::StakeTxReq => "STAKETX_REQ",
            Self::BlockReq => "BLOCK_REQ",
            Self::BlockHeaderReq => "BLOCK_HEADER_REQ",
            Self::AccReq => "ACC_REQ",
            Self::RootAccReq => "ROOTACC_REQ",
            Self::IntermediateNodesReq => "INTERMEDIATE_NODES_REQ",
            Self::FundsTxRes => "FUNDSTX_RES",
            Self::AccTxRes => "ACCTX_RES",
            Self::ConfigTxRes => "CONFIGTX_RES",
            Self::StakeTxRes => "STAKETX_RES",
            Self::BlockRes => "BLOCK_RES",
            Self::BlockHeaderRes => "BLOCK_HEADER_RES",
            Self::AccRes => "ACC_RES",
            Self::RootAccRes => "ROOTACC_RES",
            Self::IntermediateNodesRes => "INTERMEDIATE_NODES_RES",
            Self::NeighborReq => "NEIGHBOR_REQ",
            Self::NeighborRes => "NEIGHBOR_RES",
            Self::TimeBrdcst => "TIME_BRDCST",
            Self::MinerPing => "MINER_PING",
            Self::MinerPong => "MINER_PONG",
            Self::ClientPing => "CLIENT_PING",
            Self::ClientPong => "CLIENT_PONG",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        let msg = match id {
            1 => Self::FundsTxBrdcst,
            2 => Self::AccTxBrdcst,
            3 => Self::ConfigTxBrdcst,
            4 => Self::StakeTxBrdcst,
            5 => Self::VerifiedTxBrdcst,
            6 => Self::BlockBrdcst,
            7 => Self::BlockHeaderBrdcst,
            8 => Self::TxBrdcstAck,
            9 => Self::IotTxBrdcst,
            10 => Self::FundsTxReq,
            11 => Self::AccTxReq,
            12 => Self::ConfigTxReq,
            13 => Self::StakeTxReq,
            14 => Self::BlockReq,
            15 => Self::BlockHeaderReq,
            16 => Self::AccReq,
            17 => Self::RootAccReq,
            18 => Self::IntermediateNodesReq,
            20 => Self::FundsTxRes,
            21 => Self::AccTxRes,
            22 => Self::ConfigTxRes,
            23 => Self::StakeTxRes,
            24 => Self::BlockRes,
            25 => Self::BlockHeaderRes,
            26 => Self::AccRes,
            27 => Self::RootAccRes,
            28 => Self::IntermediateNodesRes,
            30 => Self::NeighborReq,
            40 => Self::NeighborRes,
            50 => Self::TimeBrdcst,
            100 => Self::MinerPing,
            101 => Self::MinerPong,
            102 => Self::ClientPing,
            103 => Self::ClientPong,
            110 => Self::NotFound,
            other => return Err(other),
        };
        Ok(msg)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.id())
    }
}
