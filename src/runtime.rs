use std::{
    cmp::Ordering,
    collections::BTreeMap,
    io::{self, Write},
};

use crate::{
    config::MachineConfig,
    device::{InputDevice, OutputDevice},
    error::MachineError,
    output,
    program::{Instruction, Program, WORDS_PER_INSTRUCTION},
    symbol::{Opcode, Register},
    word::Width,
};

/// Status flags, only written by comparisons.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Flags {
    pub carry: bool,
    pub negative: bool,
    /// Never set by any instruction
    pub overflow: bool,
    pub zero: bool,
}

impl Flags {
    /// Set from the difference of a comparison. `overflow` is left alone.
    fn set_from(&mut self, diff: i128) {
        let (carry, negative, zero) = match diff.cmp(&0) {
            Ordering::Less => (true, true, false),
            Ordering::Equal => (false, false, true),
            Ordering::Greater => (false, false, false),
        };
        self.carry = carry;
        self.negative = negative;
        self.zero = zero;
    }
}

/// How a run ended.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct RunSummary {
    /// Instructions executed
    pub steps: usize,
    /// Stopped on `END` rather than by running past the last instruction
    pub halted: bool,
}

/// What the program counter does after an instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Flow {
    Next,
    Jump(u64),
    Halt,
}

impl Flow {
    fn jump_if(cond: bool, target: u64) -> Flow {
        if cond {
            Flow::Jump(target)
        } else {
            Flow::Next
        }
    }
}

/// Register bank, sparse memory and flags of one machine, plus its devices.
pub struct Machine {
    width: Width,
    reg: [u64; Register::ALL.len()],
    /// Unset addresses read as zero
    mem: BTreeMap<u64, u64>,
    flags: Flags,
    input: Option<Box<dyn InputDevice>>,
    output: Option<Box<dyn OutputDevice>>,
    /// Receives fetch traces and state dumps in verbose mode
    trace: Option<Box<dyn Write>>,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Result<Self, MachineError> {
        let width = Width::new(config.width)?;
        let trace: Option<Box<dyn Write>> = if config.verbose {
            Some(Box::new(io::stderr()))
        } else {
            None
        };
        Ok(Machine {
            width,
            reg: [0; Register::ALL.len()],
            mem: BTreeMap::new(),
            flags: Flags::default(),
            input: None,
            output: None,
            trace,
        })
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn attach_input(&mut self, device: impl InputDevice + 'static) {
        self.input = Some(Box::new(device));
    }

    pub fn attach_output(&mut self, device: impl OutputDevice + 'static) {
        self.output = Some(Box::new(device));
    }

    /// Send the verbose trace somewhere other than stderr. Enables tracing.
    pub fn trace_to(&mut self, sink: impl Write + 'static) {
        self.trace = Some(Box::new(sink));
    }

    pub fn register(&self, reg: Register) -> u64 {
        self.reg[reg.index()]
    }

    /// Store `value mod 2^width` into a register.
    pub fn set_register(&mut self, reg: Register, value: u64) {
        self.put(reg, value as i128);
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn read_memory(&self, addr: u64) -> u64 {
        self.mem.get(&addr).copied().unwrap_or(0)
    }

    /// Store `value mod 2^width` at `addr`.
    pub fn write_memory(&mut self, addr: u64, value: u64) {
        let value = self.width.truncate(value as i128);
        self.mem.insert(addr, value);
    }

    /// Occupied memory cells in ascending address order.
    pub fn memory(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.mem.iter().map(|(addr, val)| (*addr, *val))
    }

    #[inline]
    fn put(&mut self, reg: Register, value: i128) {
        self.reg[reg.index()] = self.width.truncate(value);
    }

    #[inline]
    fn get(&self, reg: Register) -> i128 {
        self.register(reg) as i128
    }

    /// Opcode and operand occupy consecutive cells.
    pub fn load_instruction(&mut self, addr: u64, instr: Instruction) {
        self.write_memory(addr, instr.opcode as u64);
        self.write_memory(addr + 1, instr.operand);
    }

    /// Load `program` from address 0 and run it until `END` or until the program counter moves
    /// past the last instruction.
    pub fn execute(&mut self, program: &Program) -> Result<RunSummary, MachineError> {
        let end = (program.len() * WORDS_PER_INSTRUCTION) as u64;
        // Every cell of the program must be addressable by an N-bit operand
        if end > 0 && end - 1 > self.width.mask() {
            return Err(MachineError::ProgramTooLarge {
                instructions: program.len(),
                width: self.width.bits(),
            });
        }
        for (i, instr) in program.into_iter().enumerate() {
            self.load_instruction((i * WORDS_PER_INSTRUCTION) as u64, *instr);
        }
        self.put(Register::Pc, 0);

        let mut summary = RunSummary::default();
        while self.register(Register::Pc) < end {
            let (flow, next_pc) = self.step()?;
            summary.steps += 1;
            self.emit_trace(output::print_state);
            if flow == Flow::Halt {
                summary.halted = true;
                break;
            }
            // `PC` may have wrapped to an address inside the program
            if next_pc >= end as i128 {
                break;
            }
        }
        log::debug!(
            "run finished after {} steps (halted: {})",
            summary.steps,
            summary.halted
        );
        Ok(summary)
    }

    /// Read the instruction at `addr` without side effects.
    pub fn fetch_decode(&self, addr: u64) -> (u64, u64) {
        (self.read_memory(addr), self.read_memory(addr + 1))
    }

    fn decode(opcode: u64) -> Result<Opcode, MachineError> {
        u8::try_from(opcode)
            .ok()
            .and_then(|code| Opcode::try_from(code).ok())
            .ok_or(MachineError::InvalidOpcode { opcode })
    }

    /// Execute the instruction at `PC`, returning the flow and the new `PC` before it is
    /// narrowed to the word width. An invalid opcode leaves all state untouched.
    fn step(&mut self) -> Result<(Flow, i128), MachineError> {
        use Register::*;

        let pc = self.register(Pc);
        let (opcode, operand) = self.fetch_decode(pc);
        self.emit_trace(|vm, buf| output::print_decoded(vm, pc, opcode, operand, buf));
        let op = Self::decode(opcode)?;
        log::trace!("{pc:>6}: {op} {operand} ({:?})", op.group());

        let flow = match op {
            Opcode::Ldm => self.load(Acc, operand),
            Opcode::Ldd => self.load(Acc, self.read_memory(operand)),
            Opcode::Ldi => self.load(Acc, self.read_memory(self.read_memory(operand))),
            Opcode::Ldx => {
                let addr = self.register(Acc).wrapping_add(self.register(Ix));
                self.load(Acc, self.read_memory(addr))
            }
            Opcode::Ldr => self.load(Ix, operand),
            Opcode::Mov => self.load(Ix, self.register(Acc)),
            // Address comes from MAR, not from the operand
            Opcode::Sto => {
                self.write_memory(self.register(Mar), self.register(Acc));
                Flow::Next
            }
            Opcode::Nop => Flow::Next,
            Opcode::In => self.read_input()?,
            Opcode::Out => self.write_output()?,
            Opcode::AddAddress => self.accumulate(self.read_memory(operand) as i128),
            Opcode::AddImmediate => self.accumulate(operand as i128),
            Opcode::SubAddress => self.accumulate(-(self.read_memory(operand) as i128)),
            Opcode::SubImmediate => self.accumulate(-(operand as i128)),
            Opcode::Inc => self.bump(operand, 1)?,
            Opcode::Dec => self.bump(operand, -1)?,
            Opcode::Jmp => Flow::Jump(operand),
            Opcode::Jpe => Flow::jump_if(self.register(Acc) == 0, operand),
            Opcode::Jpn => Flow::jump_if(self.register(Acc) != 0, operand),
            Opcode::End => Flow::Halt,
            Opcode::CmpImmediate => self.compare(operand),
            Opcode::CmpAddress => self.compare(self.read_memory(operand)),
            Opcode::CmiAddress => self.compare(self.read_memory(self.read_memory(operand))),
        };

        let next_pc = match flow {
            Flow::Jump(target) => target as i128,
            Flow::Next | Flow::Halt => self.get(Pc) + WORDS_PER_INSTRUCTION as i128,
        };
        self.put(Pc, next_pc);
        Ok((flow, next_pc))
    }

    /// Render into the trace sink, if tracing. Trace failures never stop a run.
    fn emit_trace<F>(&mut self, render: F)
    where
        F: FnOnce(&Machine, &mut dyn Write) -> io::Result<()>,
    {
        if self.trace.is_none() {
            return;
        }
        let mut buf = Vec::new();
        let _ = render(self, &mut buf);
        if let Some(trace) = self.trace.as_mut() {
            let _ = trace.write_all(&buf);
            let _ = trace.flush();
        }
    }

    fn load(&mut self, reg: Register, value: u64) -> Flow {
        self.put(reg, value as i128);
        Flow::Next
    }

    fn read_input(&mut self) -> Result<Flow, MachineError> {
        let device = self.input.as_mut().ok_or(MachineError::MissingDevice)?;
        let value = device.read_word()?;
        self.put(Register::Acc, value as i128);
        Ok(Flow::Next)
    }

    fn write_output(&mut self) -> Result<Flow, MachineError> {
        let value = self.register(Register::Acc);
        match self.output.as_mut() {
            Some(device) => device.write_word(value)?,
            None => log::warn!("No output device: {value}"),
        }
        Ok(Flow::Next)
    }

    /// Add a signed amount to `ACC`.
    fn accumulate(&mut self, amount: i128) -> Flow {
        self.put(Register::Acc, self.get(Register::Acc) + amount);
        Flow::Next
    }

    /// `INC`/`DEC`: the operand names a register by index.
    fn bump(&mut self, index: u64, step: i128) -> Result<Flow, MachineError> {
        let reg = Register::from_index(index).ok_or(MachineError::InvalidRegister { index })?;
        self.put(reg, self.get(reg) + step);
        Ok(Flow::Next)
    }

    fn compare(&mut self, value: u64) -> Flow {
        let diff = self.get(Register::Acc) - value as i128;
        self.flags.set_from(diff);
        Flow::Next
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{assemble, error::DeviceError};

    fn machine(bits: u32) -> Machine {
        Machine::new(MachineConfig::default().with_width(bits)).unwrap()
    }

    fn program(instrs: &[(Opcode, u64)]) -> Program {
        Program::from(
            instrs
                .iter()
                .map(|(op, operand)| Instruction::op(*op, *operand))
                .collect::<Vec<_>>(),
        )
    }

    /// Output device recording every value it receives.
    fn recorder(vm: &mut Machine) -> Rc<RefCell<Vec<u64>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        vm.attach_output(move |val: u64| -> Result<(), DeviceError> {
            sink.borrow_mut().push(val);
            Ok(())
        });
        seen
    }

    #[test]
    fn rejects_narrow_width() {
        assert!(matches!(
            Machine::new(MachineConfig::default().with_width(7)),
            Err(MachineError::Configuration { width: 7 })
        ));
    }

    #[test]
    fn add_immediate() {
        let mut vm = machine(16);
        let prog = program(&[(Opcode::Ldm, 2), (Opcode::AddImmediate, 3), (Opcode::Nop, 0)]);
        vm.execute(&prog).unwrap();
        assert_eq!(vm.register(Register::Acc), 5);
    }

    #[test]
    fn sub_immediate() {
        let mut vm = machine(16);
        let prog = program(&[(Opcode::Ldm, 4), (Opcode::SubImmediate, 1), (Opcode::Nop, 0)]);
        vm.execute(&prog).unwrap();
        assert_eq!(vm.register(Register::Acc), 3);
    }

    #[test]
    fn sub_wraps_below_zero() {
        let mut vm = machine(8);
        let prog = program(&[(Opcode::Ldm, 0), (Opcode::SubImmediate, 1)]);
        vm.execute(&prog).unwrap();
        assert_eq!(vm.register(Register::Acc), 0xff);
    }

    #[test]
    fn address_arithmetic() {
        let mut vm = machine(16);
        vm.write_memory(100, 40);
        let prog = program(&[
            (Opcode::Ldm, 50),
            (Opcode::AddAddress, 100),
            (Opcode::SubAddress, 100),
            (Opcode::SubAddress, 100),
        ]);
        vm.execute(&prog).unwrap();
        assert_eq!(vm.register(Register::Acc), 10);
    }

    #[test]
    fn outputs_loaded_value() {
        let mut vm = machine(8);
        let seen = recorder(&mut vm);
        let prog = program(&[(Opcode::Ldm, 97), (Opcode::Out, 0), (Opcode::Nop, 0)]);
        vm.execute(&prog).unwrap();
        assert_eq!(*seen.borrow(), vec![97]);
    }

    #[test]
    fn input_round_trip() {
        let mut vm = machine(16);
        let seen = recorder(&mut vm);
        vm.attach_input(|| -> Result<u64, DeviceError> { Ok(15) });
        let prog = program(&[(Opcode::In, 0), (Opcode::Out, 0), (Opcode::End, 0)]);
        let summary = vm.execute(&prog).unwrap();
        assert_eq!(*seen.borrow(), vec![15]);
        assert!(summary.halted);
    }

    #[test]
    fn missing_input_device() {
        let mut vm = machine(16);
        let prog = program(&[(Opcode::In, 0)]);
        assert_eq!(vm.execute(&prog), Err(MachineError::MissingDevice));
    }

    #[test]
    fn missing_output_device_is_not_fatal() {
        let mut vm = machine(16);
        let prog = program(&[(Opcode::Ldm, 1), (Opcode::Out, 0), (Opcode::End, 0)]);
        let summary = vm.execute(&prog).unwrap();
        assert_eq!(summary.steps, 3);
    }

    #[test]
    fn device_failure_propagates() {
        let mut vm = machine(16);
        vm.attach_input(|| -> Result<u64, DeviceError> { Err(DeviceError("closed".into())) });
        let prog = program(&[(Opcode::In, 0)]);
        assert_eq!(
            vm.execute(&prog),
            Err(MachineError::Device("closed".into()))
        );
    }

    #[test]
    fn data_moves() {
        let mut vm = machine(16);
        vm.write_memory(50, 60);
        vm.write_memory(60, 7);
        vm.write_memory(53, 11);

        vm.execute(&program(&[(Opcode::Ldd, 50)])).unwrap();
        assert_eq!(vm.register(Register::Acc), 60);

        vm.execute(&program(&[(Opcode::Ldi, 50)])).unwrap();
        assert_eq!(vm.register(Register::Acc), 7);

        // ACC + IX = 50 + 3
        vm.execute(&program(&[(Opcode::Ldm, 50), (Opcode::Ldr, 3), (Opcode::Ldx, 0)]))
            .unwrap();
        assert_eq!(vm.register(Register::Acc), 11);
        assert_eq!(vm.register(Register::Ix), 3);

        vm.execute(&program(&[(Opcode::Ldm, 9), (Opcode::Mov, 0)]))
            .unwrap();
        assert_eq!(vm.register(Register::Ix), 9);
    }

    #[test]
    fn store_uses_mar() {
        let mut vm = machine(16);
        vm.set_register(Register::Mar, 200);
        vm.execute(&program(&[(Opcode::Ldm, 42), (Opcode::Sto, 99)]))
            .unwrap();
        assert_eq!(vm.read_memory(200), 42);
        assert_eq!(vm.read_memory(99), 0);
    }

    #[test]
    fn inc_dec_registers() {
        let mut vm = machine(8);
        let prog = program(&[
            (Opcode::Ldm, 0xff),
            (Opcode::Inc, Register::Acc as u64),
            (Opcode::Dec, Register::Ix as u64),
        ]);
        vm.execute(&prog).unwrap();
        assert_eq!(vm.register(Register::Acc), 0);
        assert_eq!(vm.register(Register::Ix), 0xff);
    }

    #[test]
    fn inc_unknown_register() {
        let mut vm = machine(8);
        assert_eq!(
            vm.execute(&program(&[(Opcode::Inc, 9)])),
            Err(MachineError::InvalidRegister { index: 9 })
        );
    }

    #[test]
    fn compare_sets_flags() {
        let mut vm = machine(16);
        vm.write_memory(30, 5);
        vm.write_memory(31, 30);

        vm.execute(&program(&[(Opcode::Ldm, 5), (Opcode::CmpImmediate, 5)]))
            .unwrap();
        assert_eq!(
            vm.flags(),
            Flags { zero: true, ..Flags::default() }
        );

        vm.execute(&program(&[(Opcode::Ldm, 2), (Opcode::CmpAddress, 30)]))
            .unwrap();
        assert_eq!(
            vm.flags(),
            Flags { carry: true, negative: true, ..Flags::default() }
        );

        vm.execute(&program(&[(Opcode::Ldm, 9), (Opcode::CmiAddress, 31)]))
            .unwrap();
        assert_eq!(vm.flags(), Flags::default());
    }

    #[test]
    fn conditional_jumps() {
        let mut vm = machine(16);
        // JPE taken: skips the LDM #1 at address 4
        let prog = program(&[
            (Opcode::Ldm, 0),
            (Opcode::Jpe, 6),
            (Opcode::Ldm, 1),
            (Opcode::End, 0),
        ]);
        vm.execute(&prog).unwrap();
        assert_eq!(vm.register(Register::Acc), 0);

        // JPN not taken
        let prog = program(&[
            (Opcode::Ldm, 0),
            (Opcode::Jpn, 6),
            (Opcode::Ldm, 1),
            (Opcode::End, 0),
        ]);
        vm.execute(&prog).unwrap();
        assert_eq!(vm.register(Register::Acc), 1);
    }

    #[test]
    fn unconditional_jump() {
        let mut vm = machine(16);
        let prog = program(&[
            (Opcode::Ldm, 3),
            (Opcode::Jmp, 6),
            (Opcode::Ldm, 1),
            (Opcode::End, 0),
        ]);
        let summary = vm.execute(&prog).unwrap();
        assert_eq!(vm.register(Register::Acc), 3);
        assert_eq!(summary.steps, 3);
        assert!(summary.halted);
    }

    #[test]
    fn stops_at_end_of_full_address_space() {
        // 128 instructions fill all 256 addresses of an 8-bit machine,
        // so the advance past the last one wraps `PC` to 0
        let mut vm = machine(8);
        let seen = recorder(&mut vm);
        let mut instrs = vec![(Opcode::Out, 0)];
        instrs.extend(std::iter::repeat((Opcode::Nop, 0)).take(127));
        let summary = vm.execute(&program(&instrs)).unwrap();
        assert_eq!(*seen.borrow(), vec![0]);
        assert_eq!(summary.steps, 128);
        assert!(!summary.halted);
        assert_eq!(vm.register(Register::Pc), 0);
    }

    #[test]
    fn rejects_program_beyond_address_space() {
        let mut vm = machine(8);
        let instrs = vec![(Opcode::Nop, 0); 129];
        assert_eq!(
            vm.execute(&program(&instrs)),
            Err(MachineError::ProgramTooLarge {
                instructions: 129,
                width: 8
            })
        );
        assert_eq!(vm.memory().count(), 0);
    }

    #[test]
    fn label_on_its_own_line() {
        let mut vm = machine(16);
        let summary = vm
            .execute(&assemble("  LDM #1\ndone:\n  END\n").unwrap())
            .unwrap();
        assert!(summary.halted);
        assert_eq!(vm.register(Register::Acc), 1);

        let summary = vm
            .execute(&assemble("  JMP done\n  LDM #9\ndone:\n  END\n").unwrap())
            .unwrap();
        assert!(summary.halted);
        assert_eq!(summary.steps, 3);
        assert_eq!(vm.register(Register::Acc), 1);
    }

    #[test]
    fn counting_loop_terminates() {
        let mut vm = machine(16);
        let seen = recorder(&mut vm);
        // ACC counts down from 3, emitting each value
        let prog = program(&[
            (Opcode::Ldm, 3),
            (Opcode::Out, 0),
            (Opcode::SubImmediate, 1),
            (Opcode::CmpImmediate, 0),
            (Opcode::Jpn, 2),
            (Opcode::End, 0),
        ]);
        let summary = vm.execute(&prog).unwrap();
        assert_eq!(*seen.borrow(), vec![3, 2, 1]);
        assert!(summary.halted);
        assert!(vm.flags().zero);
        assert_eq!(summary.steps, 1 + 3 * 4 + 1);
    }

    #[test]
    fn end_variants() {
        let mut vm = machine(16);
        // Data-move END does nothing, so the LDM after it runs
        let summary = vm
            .execute(&program(&[(Opcode::Nop, 0), (Opcode::Ldm, 8)]))
            .unwrap();
        assert_eq!(vm.register(Register::Acc), 8);
        assert!(!summary.halted);

        let summary = vm
            .execute(&program(&[(Opcode::End, 0), (Opcode::Ldm, 4)]))
            .unwrap();
        assert_eq!(vm.register(Register::Acc), 8);
        assert!(summary.halted);
        assert_eq!(summary.steps, 1);
    }

    #[test]
    fn truncates_writes() {
        let mut vm = machine(8);
        vm.set_register(Register::Acc, 0x1ff);
        assert_eq!(vm.register(Register::Acc), 0xff);
        vm.set_register(Register::Ix, (-3i64) as u64);
        assert_eq!(vm.register(Register::Ix), 0xfd);
        vm.write_memory(4, 0x300);
        assert_eq!(vm.read_memory(4), 0);
        assert_eq!(vm.read_memory(5), 0);

        vm.execute(&program(&[(Opcode::Ldm, 0x1234)])).unwrap();
        assert_eq!(vm.register(Register::Acc), 0x34);
    }

    #[test]
    fn invalid_opcode_mutates_nothing() {
        let mut vm = machine(16);
        let prog = program(&[(Opcode::Ldm, 7)]);
        vm.execute(&prog).unwrap();
        let before_mem: Vec<_> = vm.memory().collect();
        let before_regs = Register::ALL.map(|reg| vm.register(reg));

        // Put an unassigned opcode at PC and step directly
        vm.write_memory(2, 0xFE);
        vm.set_register(Register::Pc, 2);
        let before_mem_patched: Vec<_> = vm.memory().collect();
        assert_eq!(vm.step(), Err(MachineError::InvalidOpcode { opcode: 0xFE }));
        assert_eq!(vm.memory().collect::<Vec<_>>(), before_mem_patched);
        assert_eq!(vm.register(Register::Pc), 2);
        assert_eq!(vm.register(Register::Acc), before_regs[Register::Acc.index()]);
        assert_eq!(before_mem.len() + 1, before_mem_patched.len());
    }

    #[test]
    fn invalid_opcode_in_program() {
        let mut vm = machine(16);
        let prog = Program::from(vec![Instruction::new(0xFE, 0)]);
        assert_eq!(
            vm.execute(&prog),
            Err(MachineError::InvalidOpcode { opcode: 0xFE })
        );
        assert_eq!(vm.register(Register::Pc), 0);
        assert_eq!(vm.register(Register::Acc), 0);
    }

    #[test]
    fn assembled_matches_hand_encoded() {
        let assembled = assemble("  LDM #2\n  ADD #3\n  SUB #1\n  END\n").unwrap();
        let hand = program(&[
            (Opcode::Ldm, 2),
            (Opcode::AddImmediate, 3),
            (Opcode::SubImmediate, 1),
            (Opcode::End, 0),
        ]);
        assert_eq!(assembled, hand);

        let mut a = machine(16);
        let mut b = machine(16);
        a.execute(&assembled).unwrap();
        b.execute(&hand).unwrap();
        assert_eq!(a.register(Register::Acc), 4);
        assert_eq!(a.register(Register::Acc), b.register(Register::Acc));
    }

    #[test]
    fn assembled_loop_runs() {
        let src = "
            LDM #3
        top: OUT
            SUB #1
            JPN top
            END
        ";
        let mut vm = machine(16);
        let seen = recorder(&mut vm);
        let summary = vm.execute(&assemble(src).unwrap()).unwrap();
        assert_eq!(*seen.borrow(), vec![3, 2, 1]);
        assert!(summary.halted);
    }

    #[test]
    fn verbose_trace() {
        #[derive(Clone, Default)]
        struct Shared(Rc<RefCell<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.borrow_mut().write(buf)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut vm = machine(8);
        let sink = Shared::default();
        vm.trace_to(sink.clone());
        vm.execute(&program(&[(Opcode::Ldm, 1), (Opcode::End, 0)]))
            .unwrap();
        let text = String::from_utf8(sink.0.borrow().clone()).unwrap();
        assert!(text.contains("Fetching instruction at address 0"));
        assert!(text.contains("Fetching instruction at address 2"));
        assert!(text.contains("ACC: 00000001"));
    }
}
