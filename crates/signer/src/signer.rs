//! The EIP-155 transaction [Signer].

use crate::{
    ecdsa::{recover_prehash, sign_prehash_eip155},
    SignerError, SignerResult,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::RlpEncodable;
use duet_primitives::Transaction;
use k256::ecdsa::SigningKey;

/// Signs transactions and recovers their senders for one chain.
///
/// The chain id is folded into both the signing hash and the encoded `v`
/// value (`v = recovery_id + 35 + 2 * chain_id`), so a signature produced for
/// one chain never recovers on another.
#[derive(Debug, Clone, Copy)]
pub struct Signer {
    chain_id: u64,
}

/// The EIP-155 signing shape of a transaction: the signed fields followed by
/// `(chain_id, 0, 0)`.
#[derive(RlpEncodable)]
struct SigningEncoding {
    tx_type: u8,
    nonce: u64,
    gas_price: U256,
    gas: u64,
    to: Bytes,
    value: U256,
    data: Bytes,
    chain_id: u64,
    zero0: u8,
    zero1: u8,
}

impl Signer {
    /// Creates a new [Signer] for the given chain id.
    pub const fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    /// The chain id this signer is bound to.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The hash a sender commits to when signing a transaction.
    pub fn signing_hash(&self, tx: &Transaction) -> B256 {
        let encoding = SigningEncoding {
            tx_type: tx.tx_type.into(),
            nonce: tx.nonce,
            gas_price: tx.gas_price.unwrap_or_default(),
            gas: tx.gas,
            to: tx.to.map(|a| Bytes::copy_from_slice(a.as_slice())).unwrap_or_default(),
            value: tx.value,
            data: tx.data.clone(),
            chain_id: self.chain_id,
            zero0: 0,
            zero1: 0,
        };
        let mut buf = Vec::new();
        alloy_rlp::Encodable::encode(&encoding, &mut buf);
        keccak256(&buf)
    }

    /// Signs a transaction, returning it with `(v, r, s)` populated.
    pub fn sign(&self, tx: &Transaction, key: &SigningKey) -> SignerResult<Transaction> {
        let (v, r, s) = sign_prehash_eip155(key, self.signing_hash(tx), self.chain_id)?;
        let mut signed = tx.clone();
        signed.v = Some(v);
        signed.r = Some(r);
        signed.s = Some(s);
        Ok(signed)
    }

    /// Recovers the sender address of a transaction.
    ///
    /// A transaction with `from` populated but no signature is a dev-mode
    /// transaction: its claimed sender is returned as-is. Such transactions
    /// are only ever admitted through dev paths, never through
    /// signature-verified admission.
    pub fn sender(&self, tx: &Transaction) -> SignerResult<Address> {
        if let (Some(from), None) = (tx.from, tx.r) {
            return Ok(from);
        }
        let (Some(v), Some(r), Some(s)) = (tx.v, tx.r, tx.s) else {
            return Err(SignerError::TransactionNotSigned);
        };

        let v = v.try_into().map_err(|_| SignerError::InvalidSignature)?;
        let recovery_id = self.decode_v(v)?;
        recover_prehash(self.signing_hash(tx), r, s, recovery_id)
    }

    /// Recovers the sender and checks it against the claimed `from`.
    pub fn verify(&self, tx: &Transaction) -> SignerResult<bool> {
        let Some(from) = tx.from else {
            return Ok(false);
        };
        Ok(self.sender(tx)? == from)
    }

    /// Decodes a `v` value into a raw recovery id, accepting both EIP-155
    /// and legacy (27/28) encodings.
    fn decode_v(&self, v: u64) -> SignerResult<u8> {
        if v >= 35 {
            if (v - 35) / 2 != self.chain_id {
                return Err(SignerError::InvalidChainId);
            }
            Ok((v - 35 - 2 * self.chain_id) as u8)
        } else if v == 27 || v == 28 {
            Ok((v - 27) as u8)
        } else {
            Err(SignerError::InvalidSignature)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ecdsa::{address_of, parse_signing_key};
    use alloy_primitives::address;
    use duet_primitives::TxType;

    const CHAIN_ID: u64 = 42069;
    // Well-known development key (Foundry account #0).
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn dev_key() -> SigningKey {
        parse_signing_key(DEV_KEY).unwrap()
    }

    fn transfer_tx() -> Transaction {
        Transaction {
            tx_type: TxType::Transfer,
            nonce: 1,
            to: Some(address!("70997970c51812dc3a010c7d01b50e0d17dc79c8")),
            value: U256::from(10u64),
            gas: 21_000,
            gas_price: Some(U256::from(1_000_000_000u64)),
            data: Bytes::new(),
            ..Default::default()
        }
    }

    #[test]
    fn sign_recover_round_trip() {
        let signer = Signer::new(CHAIN_ID);
        let signed = signer.sign(&transfer_tx(), &dev_key()).unwrap();
        assert_eq!(signer.sender(&signed).unwrap(), address_of(&dev_key()));
        assert_eq!(
            signer.sender(&signed).unwrap(),
            address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266")
        );
    }

    #[test]
    fn v_encodes_the_chain_id() {
        let signed = Signer::new(CHAIN_ID).sign(&transfer_tx(), &dev_key()).unwrap();
        let v = signed.v.unwrap().to::<u64>();
        assert!(v == 2 * CHAIN_ID + 35 || v == 2 * CHAIN_ID + 36);
    }

    #[test]
    fn wrong_chain_id_is_rejected() {
        let signed = Signer::new(CHAIN_ID).sign(&transfer_tx(), &dev_key()).unwrap();
        assert_eq!(
            Signer::new(CHAIN_ID + 1).sender(&signed).unwrap_err(),
            SignerError::InvalidChainId
        );
    }

    #[test]
    fn legacy_v_values_recover() {
        let signer = Signer::new(CHAIN_ID);
        let signed = signer.sign(&transfer_tx(), &dev_key()).unwrap();
        let recovery_id = signed.v.unwrap().to::<u64>() - 35 - 2 * CHAIN_ID;

        // The same signature presented with a pre-EIP-155 v still recovers,
        // because the signing hash itself carries the chain id.
        let mut legacy = signed;
        legacy.v = Some(U256::from(27 + recovery_id));
        assert_eq!(signer.sender(&legacy).unwrap(), address_of(&dev_key()));
    }

    #[test]
    fn mutated_fields_change_the_recovered_sender() {
        let signer = Signer::new(CHAIN_ID);
        let signed = signer.sign(&transfer_tx(), &dev_key()).unwrap();
        let expected = address_of(&dev_key());

        let mut tampered = signed.clone();
        tampered.value = U256::from(11u64);
        match signer.sender(&tampered) {
            Ok(addr) => assert_ne!(addr, expected),
            Err(err) => assert_eq!(err, SignerError::InvalidSignature),
        }

        let mut tampered = signed;
        tampered.nonce = 2;
        match signer.sender(&tampered) {
            Ok(addr) => assert_ne!(addr, expected),
            Err(err) => assert_eq!(err, SignerError::InvalidSignature),
        }
    }

    #[test]
    fn dev_mode_transactions_return_their_claimed_sender() {
        let alice = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        let mut tx = transfer_tx();
        tx.from = Some(alice);
        assert_eq!(Signer::new(CHAIN_ID).sender(&tx).unwrap(), alice);
    }

    #[test]
    fn unsigned_transactions_are_rejected() {
        assert_eq!(
            Signer::new(CHAIN_ID).sender(&transfer_tx()).unwrap_err(),
            SignerError::TransactionNotSigned
        );
    }

    #[test]
    fn out_of_range_v_is_an_invalid_signature() {
        let mut tx = transfer_tx();
        tx.v = Some(U256::from(29u64));
        tx.r = Some(U256::from(1u64));
        tx.s = Some(U256::from(1u64));
        assert_eq!(
            Signer::new(CHAIN_ID).sender(&tx).unwrap_err(),
            SignerError::InvalidSignature
        );
    }

    #[test]
    fn verify_checks_the_claimed_sender() {
        let signer = Signer::new(CHAIN_ID);
        let mut tx = transfer_tx();
        tx.from = Some(address_of(&dev_key()));
        let signed = signer.sign(&tx, &dev_key()).unwrap();
        assert!(signer.verify(&signed).unwrap());

        let mut wrong = signed;
        wrong.from = Some(address!("70997970c51812dc3a010c7d01b50e0d17dc79c8"));
        assert!(!signer.verify(&wrong).unwrap());
    }

    proptest::proptest! {
        /// Invariant 7: sign-then-recover returns the key's address for any
        /// valid key and any transaction payload.
        #[test]
        fn round_trip_for_arbitrary_keys(
            raw_key in proptest::arbitrary::any::<[u8; 32]>(),
            nonce in proptest::arbitrary::any::<u64>(),
            value in proptest::arbitrary::any::<u64>(),
            data in proptest::collection::vec(proptest::arbitrary::any::<u8>(), 0..64),
        ) {
            let Ok(key) = SigningKey::from_slice(&raw_key) else {
                // Out-of-range scalars are not keys.
                return Ok(());
            };
            let tx = Transaction {
                nonce,
                value: U256::from(value),
                data: Bytes::from(data),
                ..transfer_tx()
            };
            let signer = Signer::new(CHAIN_ID);
            let signed = signer.sign(&tx, &key).unwrap();
            proptest::prop_assert_eq!(signer.sender(&signed).unwrap(), address_of(&key));
        }
    }
}
