//! Property tests over the bus and save states.

mod common;

use common::assemble_rom;
use famicore_core::Console;
use famicore_cpu::Bus;
use proptest::prelude::*;

proptest! {
    /// Any RAM write round-trips and is visible at all three mirrors.
    #[test]
    fn ram_write_visible_at_all_mirrors(addr in 0u16..0x0800, value: u8) {
        let rom = assemble_rom(&[], &[]);
        let mut console = Console::new(&rom).unwrap();
        let bus = console.bus_mut();

        bus.write(addr, value);
        prop_assert_eq!(bus.read(addr), value);
        prop_assert_eq!(bus.read(addr + 0x0800), value);
        prop_assert_eq!(bus.read(addr + 0x1000), value);
        prop_assert_eq!(bus.read(addr + 0x1800), value);
    }

    /// Writes through any mirror land in the same cell.
    #[test]
    fn ram_mirror_writes_alias(addr in 0u16..0x0800, value: u8, mirror in 0u16..4) {
        let rom = assemble_rom(&[], &[]);
        let mut console = Console::new(&rom).unwrap();
        let bus = console.bus_mut();

        bus.write(addr + mirror * 0x0800, value);
        prop_assert_eq!(bus.read(addr), value);
    }

    /// A snapshot taken after an arbitrary number of steps replays to the
    /// same CPU state.
    #[test]
    fn save_state_replay_matches(warmup in 0usize..2_000, run in 1usize..2_000) {
        let rom = assemble_rom(&[0xE6, 0x10, 0x4C, 0x00, 0x80], &[]); // INC $10; JMP $8000
        let mut console = Console::new(&rom).unwrap();
        for _ in 0..warmup {
            console.step().unwrap();
        }

        let state = console.save_state();
        for _ in 0..run {
            console.step().unwrap();
        }
        let end_cpu = console.cpu().save_state();

        console.load_state(&state).unwrap();
        for _ in 0..run {
            console.step().unwrap();
        }
        prop_assert_eq!(console.cpu().save_state(), end_cpu);
    }
}
