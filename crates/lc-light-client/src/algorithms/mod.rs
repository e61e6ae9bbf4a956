//! # Algorithms Module
//!
//! Pure, synchronous verification and encoding: codec, Merkle map and list
//! proofs, and block quorum checks.

pub mod block_proof;
pub mod codec;
pub mod list_proof;
pub mod map_proof;

pub use block_proof::verify_block_proof;
pub use codec::{
    block_hash, concat, decode_account, decode_block_header, decode_body, decode_history_entry,
    encode_account, encode_block_header, encode_body, encode_header, encode_history_entry,
    patch_length, table_key, HEADER_LENGTH,
};
pub use list_proof::{build_list_proof, list_root, MAX_LIST_SIZE};
pub use map_proof::{build_map_proof, map_root, CheckedMapProof, EMPTY_MAP_ROOT};
