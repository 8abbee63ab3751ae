use crate::time::Ticks;
use crate::REGISTER_COUNT;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VmState {
    /// Index of the instruction being executed
    ///
    /// Incremented after each instruction and reset to 0 before a run.
    /// Can be moved by [crate::op::Op::Jmp] and [crate::op::Op::DecJnz]
    pub pc: usize,
    pub registers: [i64; REGISTER_COUNT],
    /// Elapsed ticks. Only moved forward, and only by `WAIT`
    pub clock: Ticks,
    /// The total instructions executed this run
    pub steps: usize,
    /// Last `SET_TEMPO` seen. Recorded only
    pub tempo_bpm: Option<i64>,
    /// Last `SET_TS` seen. Recorded only
    pub time_signature: Option<(i64, i64)>,
    /// Last `TRACK` seen. Recorded only
    pub current_track: Option<i64>,
}
