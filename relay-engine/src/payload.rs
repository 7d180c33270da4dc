//! The cross-chain message payload a Merkle proof's leaf decodes to.

use codec::{DecodeResult, Sink, Source};

/// Downstream invocation parameters carried by a cross-chain message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MakeTxParam {
    pub tx_hash: Vec<u8>,
    pub cross_chain_id: Vec<u8>,
    pub from_contract_address: Vec<u8>,
    pub to_chain_id: u64,
    pub to_contract_address: Vec<u8>,
    pub method: String,
    pub args: Vec<u8>,
}

impl MakeTxParam {
    fn encode_into(&self, sink: &mut Sink) {
        sink.push_var_bytes(&self.tx_hash);
        sink.push_var_bytes(&self.cross_chain_id);
        sink.push_var_bytes(&self.from_contract_address);
        sink.push_u64(self.to_chain_id);
        sink.push_var_bytes(&self.to_contract_address);
        sink.push_var_string(&self.method);
        sink.push_var_bytes(&self.args);
    }

    fn decode_from(source: &mut Source) -> DecodeResult<Self> {
        Ok(MakeTxParam {
            tx_hash: source.next_var_bytes()?.to_vec(),
            cross_chain_id: source.next_var_bytes()?.to_vec(),
            from_contract_address: source.next_var_bytes()?.to_vec(),
            to_chain_id: source.next_u64()?,
            to_contract_address: source.next_var_bytes()?.to_vec(),
            method: source.next_var_string()?.to_string(),
            args: source.next_var_bytes()?.to_vec(),
        })
    }
}

/// The structured leaf payload of a cross-chain Merkle proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToMerkleValue {
    pub tx_hash: Vec<u8>,
    pub from_chain_id: u64,
    pub make_tx_param: MakeTxParam,
}

impl ToMerkleValue {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut sink = Sink::new();
        sink.push_var_bytes(&self.tx_hash);
        sink.push_u64(self.from_chain_id);
        self.make_tx_param.encode_into(&mut sink);
        sink.into_vec()
    }

    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut source = Source::new(bytes);
        let tx_hash = source.next_var_bytes()?.to_vec();
        let from_chain_id = source.next_u64()?;
        let make_tx_param = MakeTxParam::decode_from(&mut source)?;
        source.expect_exhausted()?;
        Ok(ToMerkleValue {
            tx_hash,
            from_chain_id,
            make_tx_param,
        })
    }
}
