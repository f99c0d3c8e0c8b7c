//! ID-to-path sharding resolver.
//!
//! Content records are distributed across a nested directory tree so that
//! no single directory accumulates thousands of small JSON files. A
//! [`IdSchema`](crate::models::IdSchema) declares how IDs of one exact
//! length split into directory segments; this module turns an ID plus its
//! schema into the record's relative file path. Pure string work, no I/O.

use crate::models::IdSchema;

/// Fallback chunk size when a schema declares a zero or missing `layer_size`.
const DEFAULT_LAYER_SIZE: usize = 2;

/// Resolve the record file path for `id` under `schema`.
///
/// The ID is split into consecutive chunks of `layer_size` characters,
/// consumed left to right, including a final partial chunk when the length
/// is not a multiple of the chunk size:
///
/// ```
/// use archway::models::IdSchema;
/// use archway::shard::id_to_path;
///
/// let schema = IdSchema { length: 5, layer_size: 2, data_root: "content".into() };
/// assert_eq!(id_to_path("abcde", &schema), "content/ab/cd/e/abcde.json");
/// ```
///
/// Deterministic: the same `(id, schema)` always yields the same path.
pub fn id_to_path(id: &str, schema: &IdSchema) -> String {
    let size = if schema.layer_size > 0 {
        schema.layer_size
    } else {
        DEFAULT_LAYER_SIZE
    };

    let chars: Vec<char> = id.chars().collect();
    let parts: Vec<String> = chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect();

    format!("{}/{}/{}.json", schema.data_root, parts.join("/"), id)
}

/// Select the schema for an ID by exact length match. First match wins;
/// no match means the ID is unroutable.
pub fn schema_for_id<'a>(id: &str, schemas: &'a [IdSchema]) -> Option<&'a IdSchema> {
    let len = id.chars().count();
    schemas.iter().find(|schema| schema.length == len)
}
