//! # Codec
//!
//! Binary encodings shared by transaction construction and verification:
//!
//! - the 10-byte message header and the signed transaction layout
//! - protobuf transaction bodies (tagged `bytes` / `int64` fields)
//! - fixed-width little-endian records stored in proof maps and lists
//!
//! Encoder and decoder live side by side so the two stay symmetric.

use crate::config::{MessageKind, TransactionSchema};
use crate::domain::{
    Account, BlockHeader, CreateAccount, Hash, HistoryEntry, Issue, LightClientError, MapKey,
    Transaction, TransactionBody, Transfer,
};
use lc_crypto::{PublicKey, Signature, SIGNATURE_LENGTH};
use prost::Message;

/// Length of the message header.
pub const HEADER_LENGTH: usize = 10;
/// Byte offset of the `payload_length` field.
pub const PAYLOAD_LENGTH_OFFSET: usize = 6;

/// Encode a message header with a zero length placeholder.
pub fn encode_header(
    network_id: u8,
    protocol_version: u8,
    message_id: u16,
    service_id: u16,
) -> [u8; HEADER_LENGTH] {
    let mut header = [0u8; HEADER_LENGTH];
    header[0] = network_id;
    header[1] = protocol_version;
    header[2..4].copy_from_slice(&message_id.to_le_bytes());
    header[4..6].copy_from_slice(&service_id.to_le_bytes());
    header
}

/// Overwrite the `payload_length` field of an encoded message.
pub fn patch_length(buffer: &mut [u8], total_length: u32) -> Result<(), LightClientError> {
    let len = buffer.len();
    let field = buffer
        .get_mut(PAYLOAD_LENGTH_OFFSET..PAYLOAD_LENGTH_OFFSET + 4)
        .ok_or_else(|| {
            LightClientError::Encoding(format!("buffer of {len} bytes has no length field"))
        })?;
    field.copy_from_slice(&total_length.to_le_bytes());
    Ok(())
}

/// Concatenate two buffers.
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

// -----------------------------------------------------------------------------
// Transaction bodies
// -----------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
struct CreateAccountMessage {
    #[prost(bytes = "vec", tag = "1")]
    owner_public_key: Vec<u8>,
    #[prost(int64, tag = "2")]
    initial_balance: i64,
}

#[derive(Clone, PartialEq, Message)]
struct TransferMessage {
    #[prost(int64, tag = "1")]
    seed: i64,
    #[prost(bytes = "vec", tag = "2")]
    from_account: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    to_account: Vec<u8>,
    #[prost(int64, tag = "4")]
    amount: i64,
}

#[derive(Clone, PartialEq, Message)]
struct IssueMessage {
    #[prost(bytes = "vec", tag = "1")]
    owner_public_key: Vec<u8>,
    #[prost(int64, tag = "2")]
    amount: i64,
    #[prost(int64, tag = "3")]
    seed: i64,
}

fn amount_to_wire(field: &str, amount: u64) -> Result<i64, LightClientError> {
    i64::try_from(amount)
        .map_err(|_| LightClientError::Encoding(format!("{field} {amount} exceeds int64")))
}

fn amount_from_wire(field: &str, amount: i64) -> Result<u64, LightClientError> {
    u64::try_from(amount)
        .map_err(|_| LightClientError::Encoding(format!("{field} is negative ({amount})")))
}

fn key_from_wire(field: &str, bytes: &[u8]) -> Result<PublicKey, LightClientError> {
    PublicKey::from_slice(bytes).map_err(|e| LightClientError::Encoding(format!("{field}: {e}")))
}

/// Encode a transaction body.
pub fn encode_body(body: &TransactionBody) -> Result<Vec<u8>, LightClientError> {
    let bytes = match body {
        TransactionBody::CreateAccount(tx) => CreateAccountMessage {
            owner_public_key: tx.owner.as_bytes().to_vec(),
            initial_balance: amount_to_wire("initial_balance", tx.initial_balance)?,
        }
        .encode_to_vec(),
        TransactionBody::Transfer(tx) => TransferMessage {
            // the seed is an opaque nonce, reinterpret all 64 bits
            seed: tx.seed as i64,
            from_account: tx.from.as_bytes().to_vec(),
            to_account: tx.to.as_bytes().to_vec(),
            amount: amount_to_wire("amount", tx.amount)?,
        }
        .encode_to_vec(),
        TransactionBody::Issue(tx) => IssueMessage {
            owner_public_key: tx.owner.as_bytes().to_vec(),
            amount: amount_to_wire("amount", tx.amount)?,
            seed: tx.seed as i64,
        }
        .encode_to_vec(),
    };
    Ok(bytes)
}

/// Decode a transaction body selected by its message header.
pub fn decode_body(
    schema: &TransactionSchema,
    service_id: u16,
    message_id: u16,
    bytes: &[u8],
) -> Result<TransactionBody, LightClientError> {
    let kind = schema.kind(service_id, message_id).ok_or_else(|| {
        LightClientError::Encoding(format!(
            "unknown message: service {service_id}, message {message_id}"
        ))
    })?;

    match kind {
        MessageKind::CreateAccount => {
            let msg = CreateAccountMessage::decode(bytes)?;
            Ok(TransactionBody::CreateAccount(CreateAccount {
                owner: key_from_wire("owner_public_key", &msg.owner_public_key)?,
                initial_balance: amount_from_wire("initial_balance", msg.initial_balance)?,
            }))
        }
        MessageKind::Transfer => {
            let msg = TransferMessage::decode(bytes)?;
            Ok(TransactionBody::Transfer(Transfer {
                seed: msg.seed as u64,
                from: key_from_wire("from", &msg.from_account)?,
                to: key_from_wire("to", &msg.to_account)?,
                amount: amount_from_wire("amount", msg.amount)?,
            }))
        }
        MessageKind::Issue => {
            let msg = IssueMessage::decode(bytes)?;
            Ok(TransactionBody::Issue(Issue {
                owner: key_from_wire("owner_public_key", &msg.owner_public_key)?,
                amount: amount_from_wire("amount", msg.amount)?,
                seed: msg.seed as u64,
            }))
        }
    }
}

// -----------------------------------------------------------------------------
// Signed transactions
// -----------------------------------------------------------------------------

impl Transaction {
    /// Total serialized length, signature included.
    pub fn payload_length(&self) -> usize {
        HEADER_LENGTH + self.body.len() + SIGNATURE_LENGTH
    }

    /// Header and body with the length field patched: the bytes that get signed.
    pub fn signed_bytes(&self) -> Result<Vec<u8>, LightClientError> {
        let total = u32::try_from(self.payload_length()).map_err(|_| {
            LightClientError::Encoding(format!(
                "message of {} bytes exceeds u32",
                self.payload_length()
            ))
        })?;
        let header = encode_header(
            self.network_id,
            self.protocol_version,
            self.message_id,
            self.service_id,
        );
        let mut buffer = concat(&header, &self.body);
        patch_length(&mut buffer, total)?;
        Ok(buffer)
    }

    /// Full wire encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LightClientError> {
        Ok(concat(&self.signed_bytes()?, self.signature.as_bytes()))
    }

    /// Parse the wire encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LightClientError> {
        if bytes.len() < HEADER_LENGTH + SIGNATURE_LENGTH {
            return Err(LightClientError::Encoding(format!(
                "message of {} bytes is shorter than header and signature",
                bytes.len()
            )));
        }
        let mut reader = Reader::new(&bytes[..HEADER_LENGTH]);
        let network_id = reader.u8()?;
        let protocol_version = reader.u8()?;
        let message_id = reader.u16()?;
        let service_id = reader.u16()?;
        let payload_length = reader.u32()?;
        if payload_length as usize != bytes.len() {
            return Err(LightClientError::Encoding(format!(
                "payload length field {} does not match message size {}",
                payload_length,
                bytes.len()
            )));
        }
        let split = bytes.len() - SIGNATURE_LENGTH;
        Ok(Self {
            network_id,
            protocol_version,
            message_id,
            service_id,
            body: bytes[HEADER_LENGTH..split].to_vec(),
            signature: Signature::from_slice(&bytes[split..])?,
        })
    }

    /// Transaction hash: SHA-256 of the full wire encoding.
    pub fn hash(&self) -> Result<Hash, LightClientError> {
        Ok(lc_crypto::hash(&self.to_bytes()?))
    }

    /// Decode the body using the schema table.
    pub fn decode_body(&self, schema: &TransactionSchema) -> Result<TransactionBody, LightClientError> {
        decode_body(schema, self.service_id, self.message_id, &self.body)
    }
}

// -----------------------------------------------------------------------------
// Stored records
// -----------------------------------------------------------------------------

/// Key of a service table in the state tree.
pub fn table_key(service_id: u16, table_index: u16) -> MapKey {
    lc_crypto::hash_many(&[&service_id.to_le_bytes(), &table_index.to_le_bytes()])
}

/// Encode an account record.
pub fn encode_account(account: &Account) -> Result<Vec<u8>, LightClientError> {
    let name_len = u32::try_from(account.name.len())
        .map_err(|_| LightClientError::Encoding("account name too long".to_string()))?;
    let mut out = Vec::with_capacity(32 + 4 + account.name.len() + 8 + 8 + 32);
    out.extend_from_slice(account.public_key.as_bytes());
    out.extend_from_slice(&name_len.to_le_bytes());
    out.extend_from_slice(account.name.as_bytes());
    out.extend_from_slice(&account.balance.to_le_bytes());
    out.extend_from_slice(&account.history_len.to_le_bytes());
    out.extend_from_slice(&account.history_hash);
    Ok(out)
}

/// Decode an account record.
pub fn decode_account(bytes: &[u8]) -> Result<Account, LightClientError> {
    let mut reader = Reader::new(bytes);
    let public_key = PublicKey::new(reader.array()?);
    let name_len = reader.u32()? as usize;
    let name = String::from_utf8(reader.take(name_len)?.to_vec())
        .map_err(|e| LightClientError::Encoding(format!("account name: {e}")))?;
    let account = Account {
        public_key,
        name,
        balance: reader.u64()?,
        history_len: reader.u64()?,
        history_hash: reader.array()?,
    };
    reader.finish()?;
    Ok(account)
}

/// Encode a history entry.
pub fn encode_history_entry(entry: &HistoryEntry) -> Vec<u8> {
    let mut out = Vec::with_capacity(33);
    out.extend_from_slice(&entry.tx_hash);
    out.push(u8::from(entry.execution_status));
    out
}

/// Decode a history entry.
pub fn decode_history_entry(bytes: &[u8]) -> Result<HistoryEntry, LightClientError> {
    let mut reader = Reader::new(bytes);
    let tx_hash = reader.array()?;
    let execution_status = match reader.u8()? {
        0 => false,
        1 => true,
        other => {
            return Err(LightClientError::Encoding(format!(
                "execution status byte {other}"
            )))
        }
    };
    reader.finish()?;
    Ok(HistoryEntry {
        tx_hash,
        execution_status,
    })
}

/// Encode a block header; validators sign these bytes.
pub fn encode_block_header(header: &BlockHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + 32 * 3 + 4);
    out.extend_from_slice(&header.height.to_le_bytes());
    out.extend_from_slice(&header.prev_hash);
    out.extend_from_slice(&header.tx_hash);
    out.extend_from_slice(&header.state_hash);
    out.extend_from_slice(&header.tx_count.to_le_bytes());
    out
}

/// Decode a block header.
pub fn decode_block_header(bytes: &[u8]) -> Result<BlockHeader, LightClientError> {
    let mut reader = Reader::new(bytes);
    let header = BlockHeader {
        height: reader.u64()?,
        prev_hash: reader.array()?,
        tx_hash: reader.array()?,
        state_hash: reader.array()?,
        tx_count: reader.u32()?,
    };
    reader.finish()?;
    Ok(header)
}

/// Block hash: SHA-256 of the canonical header.
pub fn block_hash(header: &BlockHeader) -> Hash {
    lc_crypto::hash(&encode_block_header(header))
}

/// Cursor over a byte slice for fixed-width decoding.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], LightClientError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                LightClientError::Encoding(format!(
                    "truncated: need {} bytes at offset {}, have {}",
                    n,
                    self.pos,
                    self.bytes.len()
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], LightClientError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, LightClientError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, LightClientError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, LightClientError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, LightClientError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn finish(self) -> Result<(), LightClientError> {
        if self.pos != self.bytes.len() {
            return Err(LightClientError::Encoding(format!(
                "{} trailing bytes",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}
