use aw_core::bus::RecordingBus;
use aw_core::input::Controls;
use aw_core::registers::ResetProfile;
use aw_core::threads::{PcRequest, INACTIVE_PC};
use aw_core::VirtualMachine;
use proptest::prelude::*;
use std::sync::Arc;

fn vm_with(code: &[u8]) -> VirtualMachine {
    let mut vm = VirtualMachine::new();
    vm.reset(0, ResetProfile::default());
    vm.set_bytecode(Arc::from(code));
    vm
}

fn tick(vm: &mut VirtualMachine) -> u32 {
    let mut bus = RecordingBus::new();
    let mut controls = Controls::new();
    vm.execute_tick(&mut controls, &mut bus)
        .expect("tick should succeed")
}

#[test]
fn init_takes_effect_on_the_next_tick() {
    let code = [
        0x08, 0x01, 0x00, 0x0A, // 00: init thread 1 at 0x0A
        0x06, //                   04: yield
        0x07, 0x00, 0x04, //       05: jmp 0x04
        0x06, 0x06, //             08: padding
        0x00, 0x10, 0x00, 0x01, // 0A: movi $10, #1
        0x06, //                   0E: yield
        0x07, 0x00, 0x0E, //       0F: jmp 0x0E
    ];
    let mut vm = vm_with(&code);

    tick(&mut vm);
    let thread = vm.threads().get(1);
    assert_eq!(thread.current_pc, INACTIVE_PC, "request must not apply mid-tick");
    assert_eq!(thread.requested_pc, PcRequest::None);
    assert_eq!(vm.threads().pending().len(), 1);
    assert_eq!(vm.register(0x10), 0);

    tick(&mut vm);
    assert_eq!(vm.threads().get(1).current_pc, 0x0F);
    assert_eq!(vm.register(0x10), 1);
}

#[test]
fn reset_all_threads_kills_from_next_tick() {
    let code = [
        0x0C, 0x00, 0x3F, 0x02, // reset 0..63, kill
        0x06, //                   yield
        0x07, 0x00, 0x04, //       jmp 0x04
    ];
    let mut vm = vm_with(&code);

    tick(&mut vm);
    assert_eq!(vm.threads().get(0).current_pc, 0x05);
    assert_eq!(vm.threads().active_count(), 1);

    assert_eq!(tick(&mut vm), 0);
    assert_eq!(vm.threads().active_count(), 0);
    assert!(vm.threads().iter().all(|t| t.current_pc == INACTIVE_PC));
}

#[test]
fn countdown_loop_runs_five_times_then_dies() {
    let code = [
        0x00, 0x00, 0x00, 0x05, // movi $00, #5
        0x09, 0x00, 0x00, 0x04, // djnz $00, 0x04
        0x11, //                   kill
    ];
    let mut vm = vm_with(&code);

    // movi, five djnz, kill
    assert_eq!(tick(&mut vm), 7);
    assert_eq!(vm.register(0), 0);
    assert!(!vm.threads().get(0).is_active());
    assert_eq!(tick(&mut vm), 0);
}

#[test]
fn threads_run_in_index_order_within_a_tick() {
    let code = [
        0x08, 0x02, 0x00, 0x0E, // 00: init thread 2 at 0x0E
        0x08, 0x01, 0x00, 0x14, // 04: init thread 1 at 0x14
        0x06, //                   08: yield
        0x07, 0x00, 0x08, //       09: jmp 0x08
        0x06, 0x06, //             0C: padding
        0x00, 0x20, 0x00, 0x02, // 0E: movi $20, #2
        0x11, //                   12: kill
        0x06, //                   13: padding
        0x00, 0x20, 0x00, 0x01, // 14: movi $20, #1
        0x11, //                   18: kill
    ];
    let mut vm = vm_with(&code);
    tick(&mut vm);
    tick(&mut vm);
    assert_eq!(vm.register(0x20), 2, "thread 2 runs after thread 1");
}

#[test]
fn unsigned_wraparound_compares_as_negative() {
    let code = [
        0x00, 0x01, 0xFF, 0xFF, // movi $01, #0xFFFF
        0x0A, 0x44, 0x01, 0x00, 0x01, 0x00, 0x10, // jlt $01, #1, 0x10
        0x00, 0x03, 0x00, 0x00, // 0B: movi $03, #0
        0x06, //                   0F: yield
        0x00, 0x03, 0x00, 0x01, // 10: movi $03, #1
        0x06, //                   14: yield
    ];
    let mut vm = vm_with(&code);
    tick(&mut vm);
    assert_eq!(vm.register(3), 1);
}

#[test]
fn paused_thread_resumes_the_tick_after_the_request() {
    let code = [
        0x08, 0x01, 0x00, 0x16, // 00: init thread 1 at 0x16
        0x06, //                   04: yield              tick 1
        0x06, //                   05: yield              tick 2
        0x0C, 0x01, 0x01, 0x01, // 06: reset 1..1, pause
        0x06, //                   0A: yield              tick 3
        0x06, //                   0B: yield              tick 4
        0x06, //                   0C: yield              tick 5
        0x0C, 0x01, 0x01, 0x00, // 0D: reset 1..1, resume
        0x06, //                   11: yield              tick 6
        0x06, //                   12: yield
        0x07, 0x00, 0x12, //       13: jmp 0x12
        0x03, 0x10, 0x00, 0x01, // 16: addi $10, #1
        0x06, //                   1A: yield
        0x07, 0x00, 0x16, //       1B: jmp 0x16
    ];
    let mut vm = vm_with(&code);
    let counts: Vec<u16> = (0..8)
        .map(|_| {
            tick(&mut vm);
            vm.register(0x10)
        })
        .collect();
    assert_eq!(counts, [0, 1, 2, 2, 2, 2, 3, 4]);
}

const CODE_WHEEL: [u8; 28] = [
    0x00, 0x1E, 0x00, 0x03, // 00: movi $1e, #3
    0x00, 0x1F, 0x00, 0x01, // 04: movi $1f, #1
    0x00, 0x20, 0x00, 0x04, // 08: movi $20, #4
    0x00, 0x21, 0x00, 0x02, // 0C: movi $21, #2
    0x0A, 0x80, 0x29, 0x1E, 0x00, 0x1B, // 10: jeq $29, $1e, 0x1B
    0x00, 0x40, 0x00, 0x01, // 16: movi $40, #1
    0x06, //                   1A: yield
    0x06, //                   1B: yield
];

#[test]
fn code_wheel_check_is_patched_when_bypass_is_enabled() {
    let mut vm = vm_with(&CODE_WHEEL);
    vm.set_protection_bypass(true);
    tick(&mut vm);
    let entered: Vec<u16> = (0x29..=0x2C).map(|r| vm.register(r)).collect();
    assert_eq!(entered, [3, 1, 4, 2]);
    assert_eq!(vm.register(0x32), 6);
    assert_eq!(vm.register(0x64), 0x14);
    assert_eq!(vm.register(0x40), 0, "jump must be taken");
    assert_eq!(vm.threads().get(0).current_pc, 0x1C);
}

#[test]
fn code_wheel_check_compares_normally_without_bypass() {
    let mut vm = vm_with(&CODE_WHEEL);
    tick(&mut vm);
    assert_eq!(vm.register(0x29), 0);
    assert_eq!(vm.register(0x32), 0);
    assert_eq!(vm.register(0x40), 1);
}

fn expected(variant: u8, a: i16, b: i16) -> bool {
    match variant {
        0 => a == b,
        1 => a != b,
        2 => a > b,
        3 => a >= b,
        4 => a < b,
        _ => a <= b,
    }
}

proptest! {
    #[test]
    fn register_comparisons_are_signed(a in any::<i16>(), b in any::<i16>(), variant in 0u8..6) {
        let [a_hi, a_lo] = (a as u16).to_be_bytes();
        let [b_hi, b_lo] = (b as u16).to_be_bytes();
        let code = [
            0x00, 0x01, a_hi, a_lo, //          00: movi $01, a
            0x00, 0x02, b_hi, b_lo, //          04: movi $02, b
            0x0A, 0x80 | variant, 0x01, 0x02, 0x00, 0x13, // 08: cjmp $01, $02, 0x13
            0x00, 0x03, 0x00, 0x00, //          0E: movi $03, #0
            0x06, //                            12: yield
            0x00, 0x03, 0x00, 0x01, //          13: movi $03, #1
            0x06, //                            17: yield
        ];
        let mut vm = vm_with(&code);
        tick(&mut vm);
        prop_assert_eq!(vm.register(3) == 1, expected(variant, a, b));
    }
}
