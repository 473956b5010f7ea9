/// Distinguishes a pool's reader workers from its writer workers.
///
/// Spec §4.3: readers within a pool run in parallel; writers within a pool
/// serialize by virtue of writer count being at most 1 (the `data` pool's
/// single writer is the exception that proves the rule — it only ever has
/// one anyway).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Reader,
    Writer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Writer => "writer",
        }
    }
}
