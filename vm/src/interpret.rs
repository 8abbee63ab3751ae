use crate::{
    backend::Backend,
    event::{AudioEvent, EventKind},
    op::Op,
    state::VmState,
};
use tracing::{debug, info, instrument, warn};

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The program counter ran past the last instruction
    EndOfProgram,
    /// A `HALT` was executed
    Halted,
    /// The instruction ceiling was reached before the program finished
    InstructionLimit,
}

enum Flow {
    Next,
    Jump(usize),
    Halt,
}

#[derive(Clone, Debug, Default)]
pub struct Vm {
    /// The maximum number of instructions to run.
    ///
    /// When this is reached the vm stops early so a program that never leaves its loop still
    /// finishes. `None` runs until the program ends.
    max_instructions: Option<usize>,
    state: VmState,
}

impl Vm {
    pub fn new(max_instructions: Option<usize>) -> Self {
        Self {
            max_instructions,
            state: VmState::default(),
        }
    }

    pub fn state(&self) -> &VmState {
        &self.state
    }

    /// Run a program from the start, handing every musical event to `backend`
    #[instrument(skip_all, fields(len = program.len()))]
    pub fn run<B: Backend>(&mut self, program: &[Op], backend: &mut B) -> Exit {
        self.reset();
        let exit = loop {
            if self.state.pc >= program.len() {
                break Exit::EndOfProgram;
            }
            if self
                .max_instructions
                .is_some_and(|max| self.state.steps >= max)
            {
                warn!(steps = self.state.steps, "instruction limit reached");
                break Exit::InstructionLimit;
            }
            if !self.step(program, backend) {
                break Exit::Halted;
            }
        };
        info!(
            ?exit,
            steps = self.state.steps,
            clock = self.state.clock,
            "run finished"
        );
        exit
    }

    /// Execute the instruction at the program counter. Returns false once halted.
    fn step<B: Backend>(&mut self, program: &[Op], backend: &mut B) -> bool {
        #[cfg(feature = "tracing")]
        {
            tracy_client::plot!("PC", self.state.pc as f64);
            tracy_client::plot!("clock", self.state.clock as f64);
        }

        let op = &program[self.state.pc];
        debug!(pc = self.state.pc, clock = self.state.clock, ?op);
        let flow = self.run_op(op, backend);
        self.state.steps += 1;

        match flow {
            Flow::Next => self.state.pc += 1,
            Flow::Jump(target) => self.state.pc = target,
            Flow::Halt => return false,
        }
        true
    }

    fn run_op<B: Backend>(&mut self, op: &Op, backend: &mut B) -> Flow {
        match op {
            Op::SetTempo(bpm) => {
                info!(bpm, "SET_TEMPO (timing stays at 120 BPM)");
                self.state.tempo_bpm = Some(*bpm);
            }
            Op::SetTimeSignature(num, den) => {
                info!("SET_TS {num}/{den}");
                self.state.time_signature = Some((*num, *den));
            }
            Op::Track(id) => {
                self.state.current_track = Some(*id);
            }
            Op::Note(note) => self.schedule(EventKind::Note(note.clone()), backend),
            Op::Chord(chord) => self.schedule(EventKind::Chord(chord.clone()), backend),
            Op::Drum(drum) => self.schedule(EventKind::Drum(drum.clone()), backend),
            Op::Wait(duration) => {
                self.state.clock = self.state.clock.saturating_add((*duration).max(0) as u64);
            }
            Op::Load(Some(register), value) => {
                self.state.registers[register.index()] = *value;
            }
            Op::DecJnz(Some(register), target) => {
                let value = &mut self.state.registers[register.index()];
                *value = value.saturating_sub(1);
                if *value > 0 {
                    if let Some(target) = target {
                        #[cfg(feature = "tracing")]
                        tracy_client::plot!("Op::DecJnz", 1.0);
                        return Flow::Jump(*target);
                    }
                }
            }
            Op::Jmp(Some(target)) => {
                #[cfg(feature = "tracing")]
                tracy_client::plot!("Op::Jmp", 1.0);
                return Flow::Jump(*target);
            }
            Op::Halt => {
                info!(pc = self.state.pc, "HALT");
                return Flow::Halt;
            }
            Op::Unknown(mnemonic) => {
                debug!(%mnemonic, "skipping unknown opcode");
            }
            Op::Load(None, _) | Op::DecJnz(None, _) | Op::Jmp(None) => {}
        }
        Flow::Next
    }

    fn schedule<B: Backend>(&mut self, kind: EventKind, backend: &mut B) {
        backend.schedule(AudioEvent::new(self.state.clock, kind), &self.state);
    }

    /// Prepare for the next run
    fn reset(&mut self) {
        self.state = VmState::default();
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        backend::NoopBackend,
        event::Schedule,
        op::{Drum, DrumKind, Note, Op, Register},
    };
    use proptest::prelude::*;

    use super::{Exit, Vm};

    fn note(pitch: i64) -> Op {
        Op::Note(Note {
            pitch,
            velocity: 80,
            duration: 240,
        })
    }

    fn r(index: usize) -> Option<Register> {
        Register::new(index)
    }

    fn run(program: &[Op]) -> (Vm, Schedule, Exit) {
        let mut vm = Vm::default();
        let mut schedule = Schedule::default();
        let exit = vm.run(program, &mut schedule);
        (vm, schedule, exit)
    }

    #[test]
    fn test_loop_without_wait_stacks_events_at_zero() {
        // LOAD R0 3 / :L / NOTE 60 80 240 / DECJNZ R0 L / HALT
        let program = [
            Op::Load(r(0), 3),
            note(60),
            Op::DecJnz(r(0), Some(1)),
            Op::Halt,
        ];
        let (vm, schedule, exit) = run(&program);
        assert_eq!(exit, Exit::Halted);
        let events = schedule.into_sorted();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|event| event.timestamp == 0));
        assert_eq!(vm.state().registers[0], 0);
    }

    #[test]
    fn test_loop_body_runs_n_times() {
        for n in 1..6 {
            let program = [
                Op::Load(r(1), n),
                note(60),
                Op::Wait(120),
                Op::DecJnz(r(1), Some(1)),
            ];
            let (vm, schedule, exit) = run(&program);
            assert_eq!(exit, Exit::EndOfProgram);
            assert_eq!(schedule.len(), n as usize);
            assert_eq!(vm.state().registers[1], 0);
            assert_eq!(vm.state().clock, 120 * n as u64);
            let stamps: Vec<u64> = schedule.events().iter().map(|e| e.timestamp).collect();
            let expected: Vec<u64> = (0..n as u64).map(|i| i * 120).collect();
            assert_eq!(stamps, expected);
        }
    }

    #[test]
    fn test_jump_lands_on_label_target() {
        // JMP skips the first note entirely
        let program = [Op::Jmp(Some(2)), note(1), note(2), Op::Halt];
        let (_, schedule, exit) = run(&program);
        assert_eq!(exit, Exit::Halted);
        let pitches: Vec<i64> = schedule
            .events()
            .iter()
            .filter_map(|e| e.kind.note_ref())
            .map(|n| n.pitch)
            .collect();
        assert_eq!(pitches, vec![2]);
    }

    #[test]
    fn test_unknown_label_is_skipped_but_register_still_decrements() {
        let program = [Op::Load(r(2), 5), Op::DecJnz(r(2), None), Op::Jmp(None), note(1)];
        let (vm, schedule, exit) = run(&program);
        assert_eq!(exit, Exit::EndOfProgram);
        assert_eq!(vm.state().registers[2], 4);
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn test_invalid_register_is_ignored() {
        let program = [Op::Load(None, 9), Op::DecJnz(None, Some(0)), note(1)];
        let (vm, schedule, _) = run(&program);
        assert_eq!(vm.state().registers, [0; 4]);
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn test_halt_stops_execution() {
        let program = [note(1), Op::Halt, note(2)];
        let (vm, schedule, exit) = run(&program);
        assert_eq!(exit, Exit::Halted);
        assert_eq!(schedule.len(), 1);
        assert_eq!(vm.state().steps, 2);
    }

    #[test]
    fn test_wait_only_moves_forward() {
        let drum = Op::Drum(Drum {
            kind: DrumKind::Snare,
            velocity: 127,
            duration: 240,
        });
        let program = [
            drum.clone(),
            note(40),
            Op::Wait(480),
            Op::Wait(-960),
            drum,
            Op::Wait(240),
        ];
        let (vm, schedule, _) = run(&program);
        let stamps: Vec<u64> = schedule.events().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![0, 0, 480]);
        assert_eq!(vm.state().clock, 720);
    }

    #[test]
    fn test_clock_saturates_instead_of_wrapping() {
        let program = [
            Op::Load(r(0), 5),
            Op::Wait(i64::MAX),
            Op::DecJnz(r(0), Some(1)),
            note(60),
        ];
        let (vm, schedule, exit) = run(&program);
        assert_eq!(exit, Exit::EndOfProgram);
        assert_eq!(vm.state().clock, u64::MAX);
        assert_eq!(schedule.events()[0].timestamp, u64::MAX);
    }

    #[test]
    fn test_cosmetic_ops_are_recorded_only() {
        let program = [
            Op::SetTempo(90),
            Op::SetTimeSignature(3, 4),
            Op::Track(1),
            Op::Unknown("ARP".to_string()),
            note(60),
        ];
        let (vm, schedule, _) = run(&program);
        assert_eq!(vm.state().tempo_bpm, Some(90));
        assert_eq!(vm.state().time_signature, Some((3, 4)));
        assert_eq!(vm.state().current_track, Some(1));
        assert_eq!(schedule.events()[0].track, crate::event::Track::Bass);
    }

    #[test]
    fn test_instruction_limit_stops_infinite_loop() {
        let program = [note(1), Op::Wait(10), Op::Jmp(Some(0))];
        let mut vm = Vm::new(Some(30));
        let mut schedule = Schedule::default();
        let exit = vm.run(&program, &mut schedule);
        assert_eq!(exit, Exit::InstructionLimit);
        assert_eq!(vm.state().steps, 30);
        assert_eq!(schedule.len(), 10);
    }

    #[test]
    fn test_runs_are_independent() {
        let program = [Op::Load(r(0), 7), Op::Wait(100)];
        let mut vm = Vm::default();
        vm.run(&program, &mut NoopBackend);
        vm.run(&program, &mut NoopBackend);
        assert_eq!(vm.state().clock, 100);
        assert_eq!(vm.state().steps, 2);
    }

    fn arb_op(len: usize) -> impl Strategy<Value = Op> {
        let target = prop::option::of(0..=len);
        let register = prop::option::of((0..4usize).prop_map(|i| Register::new(i).unwrap()));
        prop_oneof![
            (0..128i64).prop_map(note),
            (-100..1000i64).prop_map(Op::Wait),
            (register.clone(), -5..10i64).prop_map(|(r, v)| Op::Load(r, v)),
            (register, target.clone()).prop_map(|(r, t)| Op::DecJnz(r, t)),
            target.prop_map(Op::Jmp),
            Just(Op::Halt),
        ]
    }

    proptest! {
        #[test]
        fn test_never_panics_and_clock_is_monotonic(
            program in prop::collection::vec(arb_op(16), 0..16)
        ) {
            let mut vm = Vm::new(Some(2_000));
            let mut schedule = Schedule::default();
            vm.run(&program, &mut schedule);
            for pair in schedule.events().windows(2) {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
            prop_assert!(vm.state().steps <= 2_000);
        }
    }
}
