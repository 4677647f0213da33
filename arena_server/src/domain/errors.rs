// Domain-level rejections for player and host commands.
//
// None of these are fatal: the command is dropped, no state changes, and the
// reason can be surfaced to whoever issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedAction {
    UnknownPlayer,
    AlreadyJoined,
    PlayerDead,
    BombLimitReached,
    CellHasBomb,
    StatAtMaximum,
    Blocked,
    WrongPhase,
}
