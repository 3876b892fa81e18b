//! Derived store identity.
//!
//! Stores have no natural primary key: the business-registration number is
//! the stable identifier when present, and a hash of name+address stands in
//! otherwise. The persisted dataset and the edit history both carry ids in
//! this format, so the algorithm is frozen here — every consumer (edit
//! lookup, history correlation, API paths) must call [`store_id`] rather
//! than re-deriving it.

use crate::record::StoreRecord;

/// Derive the stable identifier for a store record.
///
/// Returns `BIZ_<business number>` when a usable business-registration
/// number is present, else `STORE_<hash>` where the hash is a 32-bit signed
/// rolling hash over the UTF-16 code units of `<name>_<address>` (trimmed,
/// absent fields as empty strings). The hash matches the historical
/// JavaScript implementation (`h = (h << 5) - h + codeUnit`, truncated to
/// 32 bits each step, absolute value taken at the end) so ids persisted by
/// earlier versions of the dataset keep resolving.
///
/// Deterministic and pure. Collisions between two distinct name/address
/// pairs are theoretically possible and accepted; see the test below.
#[must_use]
pub fn store_id(record: &StoreRecord) -> String {
    if let Some(business_no) = record.business_no() {
        return format!("BIZ_{business_no}");
    }

    let combined = format!(
        "{}_{}",
        record.store_name.trim(),
        record.address.trim()
    );

    let mut hash: i32 = 0;
    for unit in combined.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }

    format!("STORE_{}", hash.unsigned_abs())
}
