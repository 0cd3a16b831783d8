use crate::bus::Bus;
use crate::cursor::Cursor;
use crate::input::Controls;
use crate::opcode::{Condition, Instruction, Operand, ResetAction};
use crate::polygon::Point;
use crate::registers::{
    CallStack, Registers, ResetProfile, REG_CODE_ANSWER, REG_CODE_ATTEMPTS, REG_CODE_ENTERED,
    REG_CODE_TIMER, REG_PAUSE_SLICES, REG_SCROLL_Y,
};
use crate::threads::{
    PcRequest, PendingUpdate, Thread, ThreadTable, INACTIVE_PC, THREAD_COUNT, THREAD_ID_MASK,
};
use crate::timer::FrameClock;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Instructions one thread may execute in a single slice before it is declared stuck.
pub const DEFAULT_INSTRUCTION_BUDGET: u32 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame clock was not due; nothing ran.
    Skipped,
    Executed { instructions: u32 },
}

/// Serializable interpreter state between two ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VmState {
    pub registers: Vec<u16>,
    pub threads: Vec<Thread>,
    #[serde(default)]
    pub pending: Vec<PendingUpdate>,
    pub clock: FrameClock,
    pub tick_count: u64,
}

/// The script interpreter and its cooperative scheduler.
pub struct VirtualMachine {
    cursor: Cursor,
    loaded: bool,
    registers: Registers,
    stack: CallStack,
    threads: ThreadTable,
    clock: FrameClock,
    instruction_budget: u32,
    tick_count: u64,
    halted: bool,
    protection_bypass: bool,
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualMachine {
    pub fn new() -> Self {
        Self {
            cursor: Cursor::new(Arc::from(Vec::new())),
            loaded: false,
            registers: Registers::new(),
            stack: CallStack::new(),
            threads: ThreadTable::new(),
            clock: FrameClock::default(),
            instruction_budget: DEFAULT_INSTRUCTION_BUDGET,
            tick_count: 0,
            halted: false,
            protection_bypass: false,
        }
    }

    pub fn set_frame_slice(&mut self, slice_ms: u32) {
        self.clock.slice_ms = slice_ms;
    }

    pub fn set_instruction_budget(&mut self, budget: u32) {
        self.instruction_budget = budget.max(1);
    }

    /// Make the code-wheel check (`jeq $29, $1e`) copy the expected symbols
    /// and jump as if the player had entered them.
    pub fn set_protection_bypass(&mut self, enabled: bool) {
        self.protection_bypass = enabled;
    }

    pub fn protection_bypass(&self) -> bool {
        self.protection_bypass
    }

    /// Power-on reset: registers get their initial values and the halt latch clears.
    pub fn reset(&mut self, seed: u16, profile: ResetProfile) {
        self.registers.reset(seed, profile);
        self.stack.clear();
        self.threads.restart();
        self.clock = FrameClock::new(self.clock.slice_ms);
        self.tick_count = 0;
        self.halted = false;
    }

    /// Install the script image of a new part.
    ///
    /// All threads stop except thread 0, which starts at offset 0. Register
    /// values carry over from the previous part.
    pub fn set_bytecode(&mut self, image: Arc<[u8]>) {
        debug!(len = image.len(), "installing bytecode");
        self.cursor = Cursor::new(image);
        self.loaded = true;
        self.threads.restart();
        self.stack.clear();
    }

    pub fn register(&self, index: u8) -> u16 {
        self.registers.get(index)
    }

    pub fn set_register(&mut self, index: u8, value: u16) {
        self.registers.set(index, value);
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn threads(&self) -> &ThreadTable {
        &self.threads
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// One host tick: gate on the frame clock, then run every thread once.
    pub fn run<B: Bus>(&mut self, controls: &mut Controls, bus: &mut B) -> Result<TickOutcome> {
        if self.halted {
            return Err(CoreError::Halted);
        }
        let now = bus.ticks();
        if !self.clock.is_ready(now, controls.is_idle()) {
            return Ok(TickOutcome::Skipped);
        }
        let instructions = self.execute_tick(controls, bus)?;
        let now = bus.ticks();
        self.clock
            .reschedule(now, self.registers.get(REG_PAUSE_SLICES));
        Ok(TickOutcome::Executed { instructions })
    }

    /// Input capture, deferred state apply and the execution pass, without the clock gate.
    pub fn execute_tick<B: Bus>(&mut self, controls: &mut Controls, bus: &mut B) -> Result<u32> {
        if self.halted {
            return Err(CoreError::Halted);
        }
        if !self.loaded {
            return Err(CoreError::NoBytecode);
        }
        controls.capture(&mut self.registers);
        self.threads.apply_pending();
        self.tick_count += 1;

        let mut total = 0u32;
        for id in 0..THREAD_COUNT as u8 {
            match self.run_thread(id, bus) {
                Ok(count) => total = total.saturating_add(count),
                Err(err) => {
                    let thread = self.threads.get(id);
                    error!(
                        thread = id,
                        pc = format_args!("{:#06x}", self.cursor.offset()),
                        opcode = format_args!("{:#04x}", thread.opcode),
                        "fatal script error: {err}"
                    );
                    self.halted = true;
                    return Err(err);
                }
            }
        }
        Ok(total)
    }

    fn run_thread<B: Bus>(&mut self, id: u8, bus: &mut B) -> Result<u32> {
        let thread = self.threads.get(id);
        if !thread.is_runnable() {
            return Ok(0);
        }
        let start = thread.current_pc;
        self.stack.clear();
        self.cursor.seek(start);
        self.threads.get_mut(id).yielded = false;

        let mut executed = 0u32;
        while !self.threads.get(id).yielded {
            if executed >= self.instruction_budget {
                return Err(CoreError::RunawayThread {
                    thread: id,
                    pc: self.cursor.offset(),
                });
            }
            self.step(id, bus)?;
            executed += 1;
            self.threads.get_mut(id).current_pc = self.cursor.offset();
        }
        Ok(executed)
    }

    fn step<B: Bus>(&mut self, id: u8, bus: &mut B) -> Result<()> {
        let pc = self.cursor.offset();
        let opcode = self.cursor.fetch_byte()?;
        self.threads.get_mut(id).opcode = opcode;
        let instr = Instruction::decode(opcode, &mut self.cursor, pc)?;
        trace!(thread = id, pc = format_args!("{pc:04x}"), "{instr}");
        self.execute(id, pc, instr, bus)
    }

    fn execute<B: Bus>(&mut self, id: u8, pc: u16, instr: Instruction, bus: &mut B) -> Result<()> {
        let regs = &mut self.registers;
        match instr {
            Instruction::MovImm { dst, value } => regs.set(dst, value),
            Instruction::MovReg { dst, src } => regs.set(dst, regs.get(src)),
            Instruction::AddReg { dst, src } => {
                regs.set(dst, regs.get(dst).wrapping_add(regs.get(src)))
            }
            Instruction::AddImm { dst, value } => regs.set(dst, regs.get(dst).wrapping_add(value)),
            Instruction::SubReg { dst, src } => {
                regs.set(dst, regs.get(dst).wrapping_sub(regs.get(src)))
            }
            Instruction::AndImm { dst, value } => regs.set(dst, regs.get(dst) & value),
            Instruction::OrImm { dst, value } => regs.set(dst, regs.get(dst) | value),
            Instruction::ShlImm { dst, value } => {
                regs.set(dst, regs.get(dst).checked_shl(value as u32).unwrap_or(0))
            }
            Instruction::ShrImm { dst, value } => {
                regs.set(dst, regs.get(dst).checked_shr(value as u32).unwrap_or(0))
            }
            Instruction::Call { target } => {
                self.stack.push(self.cursor.offset(), pc)?;
                self.cursor.seek(target);
            }
            Instruction::Ret => {
                let target = self.stack.pop(pc)?;
                self.cursor.seek(target);
            }
            Instruction::Yield => self.threads.get_mut(id).yielded = true,
            Instruction::Jump { target } => self.cursor.seek(target),
            Instruction::Init { thread, pc: target } => {
                self.threads.request_pc(thread, PcRequest::from_wire(target));
            }
            Instruction::Djnz { reg, target } => {
                let value = regs.get(reg).wrapping_sub(1);
                regs.set(reg, value);
                if value != 0 {
                    self.cursor.seek(target);
                }
            }
            Instruction::CondJump {
                condition,
                lhs,
                rhs,
                target,
            } => {
                if self.protection_bypass
                    && condition == Condition::Eq
                    && lhs == REG_CODE_ENTERED
                    && rhs == Operand::Reg(REG_CODE_ANSWER)
                {
                    debug!(thread = id, pc, "bypassing code wheel");
                    for i in 0..4 {
                        regs.set(REG_CODE_ENTERED + i, regs.get(REG_CODE_ANSWER + i));
                    }
                    regs.set(REG_CODE_ATTEMPTS, 6);
                    regs.set(REG_CODE_TIMER, 0x14);
                    self.cursor.seek(target);
                } else if condition.holds(regs.get(lhs), rhs.resolve(regs)) {
                    self.cursor.seek(target);
                }
            }
            Instruction::ResetThreads {
                first,
                last,
                action,
            } => {
                let first = first & THREAD_ID_MASK;
                let last = last & THREAD_ID_MASK;
                if last < first {
                    warn!(first, last, pc, "ignoring reset with inverted thread range");
                    return Ok(());
                }
                for thread in first..=last {
                    match action {
                        ResetAction::State(state) => self.threads.request_state(thread, state),
                        ResetAction::Kill => self.threads.request_pc(thread, PcRequest::Kill),
                    }
                }
            }
            Instruction::Kill => {
                self.cursor.seek(INACTIVE_PC);
                self.threads.get_mut(id).yielded = true;
            }
            Instruction::Palette { value } => bus.select_palette((value >> 8) as u8),
            Instruction::SelectPage { page } => bus.select_page(page),
            Instruction::FillPage { page, color } => bus.fill_page(page, color),
            Instruction::CopyPage { src, dst } => {
                bus.copy_page(dst, src, regs.get_signed(REG_SCROLL_Y))
            }
            Instruction::BlitPage { page } => bus.blit_page(page),
            Instruction::DrawString { id, x, y, color } => {
                bus.draw_string(id, x as u16, y as u16, color)
            }
            Instruction::PlaySound {
                id,
                frequency,
                volume,
                channel,
            } => bus.play_sound(id, channel, volume, frequency),
            Instruction::LoadResource { id } => bus.load_resource(id),
            Instruction::PlayMusic {
                id,
                delay,
                position,
            } => bus.play_music(id, position, delay),
            Instruction::DrawPolygon(draw) => {
                let position = Point::new(
                    draw.x.resolve(regs) as i16,
                    draw.y.resolve(regs) as i16,
                );
                let zoom = draw.zoom.resolve(regs);
                bus.draw_polygons(draw.bank, draw.offset, position, zoom);
            }
        }
        Ok(())
    }

    pub fn capture_state(&self) -> VmState {
        VmState {
            registers: self.registers.as_slice().to_vec(),
            threads: self.threads.threads().to_vec(),
            pending: self.threads.pending().to_vec(),
            clock: self.clock,
            tick_count: self.tick_count,
        }
    }

    pub fn restore_state(&mut self, state: &VmState) -> Result<()> {
        let threads: [Thread; THREAD_COUNT] =
            state.threads.clone().try_into().map_err(|t: Vec<Thread>| {
                CoreError::InvalidSnapshot(format!(
                    "thread table length mismatch (expected {THREAD_COUNT}, got {})",
                    t.len()
                ))
            })?;
        self.registers.load(&state.registers)?;
        self.threads.restore(threads, state.pending.clone());
        self.clock = state.clock;
        self.tick_count = state.tick_count;
        self.stack.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusEvent, RecordingBus};
    use crate::opcode::PolygonBank;

    fn vm_with(code: &[u8]) -> VirtualMachine {
        let mut vm = VirtualMachine::new();
        vm.reset(0, ResetProfile::default());
        vm.set_bytecode(Arc::from(code));
        vm
    }

    fn tick(vm: &mut VirtualMachine, bus: &mut RecordingBus) -> Result<u32> {
        let mut controls = Controls::new();
        vm.execute_tick(&mut controls, bus)
    }

    #[test]
    fn arithmetic_wraps() {
        let code = [
            0x00, 0x01, 0xFF, 0xFF, // movi $01, 0xffff
            0x03, 0x01, 0x00, 0x02, // addi $01, 2
            0x00, 0x02, 0x00, 0x05, // movi $02, 5
            0x13, 0x02, 0x01, // subr $02, $01
            0x16, 0x02, 0x00, 0x10, // shli $02, 16
            0x06,
        ];
        let mut vm = vm_with(&code);
        let mut bus = RecordingBus::new();
        tick(&mut vm, &mut bus).unwrap();
        assert_eq!(vm.register(1), 1);
        assert_eq!(vm.register(2), 0);
    }

    #[test]
    fn call_and_ret_balance() {
        let code = [
            0x04, 0x00, 0x05, // call @0005
            0x06, // yield
            0x06, // (unused)
            0x03, 0x07, 0x00, 0x01, // addi $07, 1
            0x05, // ret
        ];
        let mut vm = vm_with(&code);
        let mut bus = RecordingBus::new();
        assert_eq!(tick(&mut vm, &mut bus).unwrap(), 4);
        assert_eq!(vm.register(7), 1);
        assert_eq!(vm.stack().depth(), 0);
        assert_eq!(vm.threads().get(0).current_pc, 4);
    }

    #[test]
    fn ret_on_empty_stack_halts() {
        let mut vm = vm_with(&[0x05]);
        let mut bus = RecordingBus::new();
        assert!(matches!(
            tick(&mut vm, &mut bus),
            Err(CoreError::StackUnderflow { pc: 0 })
        ));
        assert!(vm.is_halted());
        assert!(matches!(tick(&mut vm, &mut bus), Err(CoreError::Halted)));
    }

    #[test]
    fn unbounded_recursion_overflows() {
        let mut vm = vm_with(&[0x04, 0x00, 0x00]);
        let mut bus = RecordingBus::new();
        assert!(matches!(
            tick(&mut vm, &mut bus),
            Err(CoreError::StackOverflow { .. })
        ));
    }

    #[test]
    fn runaway_thread_is_fatal() {
        let mut vm = vm_with(&[0x07, 0x00, 0x00]);
        vm.set_instruction_budget(64);
        let mut bus = RecordingBus::new();
        assert!(matches!(
            tick(&mut vm, &mut bus),
            Err(CoreError::RunawayThread { thread: 0, .. })
        ));
    }

    #[test]
    fn copy_uses_scroll_register() {
        let code = [
            0x00, 0xF9, 0xFF, 0xF6, // movi $f9, -10
            0x0F, 0x41, 0x00, // copy 0x41 -> 0
            0x06,
        ];
        let mut vm = vm_with(&code);
        let mut bus = RecordingBus::new();
        tick(&mut vm, &mut bus).unwrap();
        assert_eq!(
            bus.events(),
            &[BusEvent::CopyPage {
                dst: 0,
                src: 0x41,
                vscroll: -10
            }]
        );
    }

    #[test]
    fn polygon_operands_read_registers_at_execution() {
        let code = [
            0x00, 0x10, 0x00, 0xA0, // movi $10, 160
            0x00, 0x11, 0xFF, 0xFF, // movi $11, -1
            0x55, 0x00, 0x04, 0x10, 0x11, 0x12, // poly1 x=$10 y=$11 zoom=$12
            0x06,
        ];
        let mut vm = vm_with(&code);
        vm.set_register(0x12, 0x80);
        let mut bus = RecordingBus::new();
        tick(&mut vm, &mut bus).unwrap();
        assert_eq!(
            bus.events(),
            &[BusEvent::DrawPolygons {
                bank: PolygonBank::Primary,
                offset: 8,
                position: Point::new(160, -1),
                zoom: 0x80
            }]
        );
    }

    #[test]
    fn run_is_gated_by_clock() {
        let mut vm = vm_with(&[0x06]);
        let mut bus = RecordingBus::new();
        let mut controls = Controls::new();
        vm.set_register(REG_PAUSE_SLICES, 2);
        bus.now = 0;
        assert!(matches!(
            vm.run(&mut controls, &mut bus).unwrap(),
            TickOutcome::Executed { .. }
        ));
        bus.now = 39;
        assert_eq!(vm.run(&mut controls, &mut bus).unwrap(), TickOutcome::Skipped);
        bus.now = 40;
        assert!(matches!(
            vm.run(&mut controls, &mut bus).unwrap(),
            TickOutcome::Executed { .. }
        ));
        assert_eq!(vm.tick_count(), 2);
    }

    #[test]
    fn paused_controls_skip_ticks() {
        let mut vm = vm_with(&[0x06]);
        let mut bus = RecordingBus::new();
        let mut controls = Controls::new();
        controls.paused = true;
        assert_eq!(vm.run(&mut controls, &mut bus).unwrap(), TickOutcome::Skipped);
        assert_eq!(vm.tick_count(), 0);
    }

    #[test]
    fn inverted_reset_range_is_ignored() {
        let code = [
            0x0C, 0x05, 0x02, 0x02, // reset 5..=2 kill
            0x06,
        ];
        let mut vm = vm_with(&code);
        let mut bus = RecordingBus::new();
        tick(&mut vm, &mut bus).unwrap();
        assert!(vm.threads().pending().is_empty());
    }

    #[test]
    fn state_round_trips() {
        let code = [0x08, 0x03, 0x00, 0x00, 0x06];
        let mut vm = vm_with(&code);
        let mut bus = RecordingBus::new();
        tick(&mut vm, &mut bus).unwrap();
        let state = vm.capture_state();
        assert_eq!(state.pending.len(), 1);

        let mut other = vm_with(&code);
        other.restore_state(&state).unwrap();
        assert_eq!(other.capture_state(), state);
    }
}
