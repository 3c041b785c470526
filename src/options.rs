/// How a map with repeated keys is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapKeyPolicy {
    /// A repeated key overwrites the earlier value in place; the key keeps the
    /// position of its first occurrence.
    #[default]
    LastWins,
    /// Every entry is kept in storage order, duplicates included.
    KeepAll,
}

#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    uuid_multi_column_guard: bool,
    map_duplicate_keys: MapKeyPolicy,
    canonicalize_structured_text: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            uuid_multi_column_guard: true,
            map_duplicate_keys: MapKeyPolicy::LastWins,
            canonicalize_structured_text: true,
        }
    }
}

impl MaterializeOptions {
    /// Nulls every cell of a multi-column result containing a uuid column on
    /// the flat path. On by default; the flat path's single-cell uuid read
    /// corrupts later columns of the same row otherwise.
    pub fn set_uuid_multi_column_guard(&mut self, enabled: bool) -> &mut Self {
        self.uuid_multi_column_guard = enabled;
        self
    }

    pub fn set_map_duplicate_keys(&mut self, policy: MapKeyPolicy) -> &mut Self {
        self.map_duplicate_keys = policy;
        self
    }

    /// Whether the flat path parses bracket/brace text of list, struct, map
    /// and array columns into typed values.
    pub fn set_canonicalize_structured_text(&mut self, enabled: bool) -> &mut Self {
        self.canonicalize_structured_text = enabled;
        self
    }

    pub fn uuid_multi_column_guard(&self) -> bool {
        self.uuid_multi_column_guard
    }

    pub fn map_duplicate_keys(&self) -> MapKeyPolicy {
        self.map_duplicate_keys
    }

    pub fn canonicalize_structured_text(&self) -> bool {
        self.canonicalize_structured_text
    }
}
