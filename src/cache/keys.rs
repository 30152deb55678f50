//! Cache key layout.

use crate::domain::songs::SongField;

/// Hash fields written for every cached song, in write order.
pub const SONG_HASH_FIELDS: [SongField; 5] = SongField::UPDATE_ORDER;

/// Key of the hash holding song `id`.
pub fn song_key(id: i64) -> String {
    id.to_string()
}
