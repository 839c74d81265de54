//! The CPU-side system bus.
//!
//! Routes every CPU access to its destination and carries the signals the
//! components exchange (NMI edge, IRQ level, DMA stalls, frame completion).
//!
//! ```text
//! $0000-$1FFF  2 KiB RAM, mirrored every $0800
//! $2000-$3FFF  PPU registers, mirrored every 8
//! $4000-$4013  APU channel registers
//! $4014        OAM DMA trigger
//! $4015        APU status
//! $4016        controller strobe / port 1 data
//! $4017        APU frame counter (write) / port 2 data (read)
//! $4018-$401F  test mode, open bus
//! $4020-$FFFF  cartridge via the mapper
//! ```

use serde::{Deserialize, Serialize};

use famicore_apu::{Apu, FETCH_STALL_CYCLES};
use famicore_cpu::Bus;
use famicore_mappers::{Mapper, Mirroring};
use famicore_ppu::Ppu;

use crate::controller::Controller;

/// CPU RAM size before mirroring.
const RAM_SIZE: usize = 0x800;

/// Bus-level signal state captured in save states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusState {
    /// CPU RAM contents.
    pub ram: Vec<u8>,
    /// Open-bus byte.
    pub open_bus: u8,
    /// Undelivered NMI edge.
    pub nmi_edge: bool,
    /// Undelivered stall cycles.
    pub pending_stall: u16,
    /// Frame-complete latch.
    pub frame_complete: bool,
    /// CPU cycles seen by the bus (DMA parity).
    pub cpu_cycles: u64,
    /// Controller port 1.
    pub controller1: Controller,
    /// Controller port 2.
    pub controller2: Controller,
}

/// The system bus: RAM, PPU, APU, cartridge, controllers.
pub struct SystemBus {
    ram: [u8; RAM_SIZE],
    /// Picture unit.
    pub ppu: Ppu,
    /// Audio unit.
    pub apu: Apu,
    /// Cartridge address translation.
    pub mapper: Box<dyn Mapper>,
    controller1: Controller,
    controller2: Controller,
    /// Last value driven on the data bus; undriven reads return it.
    open_bus: u8,
    /// NMI edge raised by the PPU, consumed by the coordinator.
    nmi_edge: bool,
    /// Stall cycles owed to the CPU (OAM DMA, DMC fetches).
    pending_stall: u16,
    /// Set when the PPU finishes a frame; cleared by the coordinator.
    frame_complete: bool,
    /// CPU cycles ticked, for DMA parity.
    cpu_cycles: u64,
}

/// Convert the cartridge-side mirroring enum to the PPU's.
fn ppu_mirroring(mode: Mirroring) -> famicore_ppu::Mirroring {
    match mode {
        Mirroring::Horizontal => famicore_ppu::Mirroring::Horizontal,
        Mirroring::Vertical => famicore_ppu::Mirroring::Vertical,
        Mirroring::SingleLower => famicore_ppu::Mirroring::SingleLower,
        Mirroring::SingleUpper => famicore_ppu::Mirroring::SingleUpper,
        Mirroring::FourScreen => famicore_ppu::Mirroring::FourScreen,
    }
}

impl SystemBus {
    /// Assemble the bus around a mapper, PPU, and APU.
    #[must_use]
    pub fn new(mapper: Box<dyn Mapper>, apu: Apu) -> Self {
        let ppu = Ppu::new(ppu_mirroring(mapper.mirroring()));
        Self {
            ram: [0; RAM_SIZE],
            ppu,
            apu,
            mapper,
            controller1: Controller::new(),
            controller2: Controller::new(),
            open_bus: 0,
            nmi_edge: false,
            pending_stall: 0,
            frame_complete: false,
            cpu_cycles: 0,
        }
    }

    /// Controller port 1.
    pub fn controller1_mut(&mut self) -> &mut Controller {
        &mut self.controller1
    }

    /// Controller port 2.
    pub fn controller2_mut(&mut self) -> &mut Controller {
        &mut self.controller2
    }

    /// Advance the PPU (x3), APU (x1), and mapper for `cpu_cycles` cycles.
    pub fn tick(&mut self, cpu_cycles: u8) {
        for _ in 0..cpu_cycles {
            self.ppu.set_mirroring(ppu_mirroring(self.mapper.mirroring()));

            for _ in 0..3 {
                let Self { ppu, mapper, .. } = self;
                let events = ppu.step(|addr| mapper.read_chr(addr));
                if events.nmi {
                    self.nmi_edge = true;
                }
                if events.frame_complete {
                    self.frame_complete = true;
                }
                if events.scanline_tick {
                    self.mapper.notify_scanline();
                }
            }

            self.apu.clock();
            if self.apu.dmc_needs_sample() {
                let addr = self.apu.dmc_sample_address();
                let value = self.mapper.read_prg(addr);
                self.apu.dmc_load_sample(value);
                self.pending_stall += FETCH_STALL_CYCLES;
            }

            self.mapper.step_cycles(1);
            self.cpu_cycles += 1;
        }
    }

    /// Take the pending NMI edge, clearing it.
    pub fn take_nmi_edge(&mut self) -> bool {
        std::mem::take(&mut self.nmi_edge)
    }

    /// Current IRQ line level (APU frame counter, DMC, or mapper).
    #[must_use]
    pub fn irq_line(&self) -> bool {
        self.apu.irq_pending() || self.mapper.irq_pending()
    }

    /// Take the pending stall cycles, clearing them.
    pub fn take_pending_stall(&mut self) -> u16 {
        std::mem::take(&mut self.pending_stall)
    }

    /// Take the frame-complete latch, clearing it.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    /// CPU cycles the bus has ticked through.
    #[must_use]
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    /// OAM DMA: copy 256 bytes from `page << 8` into OAM and charge the
    /// CPU 513 or 514 stall cycles depending on cycle parity.
    fn oam_dma(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        let mut buffer = [0u8; 256];
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.dma_read(base.wrapping_add(i as u16));
        }
        self.ppu.write_oam_dma(&buffer);
        self.pending_stall += 513 + (self.cpu_cycles & 1) as u16;
    }

    /// DMA source read: plain memory only, no register side effects.
    fn dma_read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[addr as usize % RAM_SIZE],
            0x4020..=0xFFFF => self.mapper.read_prg(addr),
            _ => self.open_bus,
        }
    }

    /// Snapshot bus-level state for a save state.
    #[must_use]
    pub fn save_state(&self) -> BusState {
        BusState {
            ram: self.ram.to_vec(),
            open_bus: self.open_bus,
            nmi_edge: self.nmi_edge,
            pending_stall: self.pending_stall,
            frame_complete: self.frame_complete,
            cpu_cycles: self.cpu_cycles,
            controller1: self.controller1.clone(),
            controller2: self.controller2.clone(),
        }
    }

    /// Restore bus-level state from a save state.
    pub fn load_state(&mut self, state: &BusState) {
        if state.ram.len() == RAM_SIZE {
            self.ram.copy_from_slice(&state.ram);
        }
        self.open_bus = state.open_bus;
        self.nmi_edge = state.nmi_edge;
        self.pending_stall = state.pending_stall;
        self.frame_complete = state.frame_complete;
        self.cpu_cycles = state.cpu_cycles;
        self.controller1 = state.controller1.clone();
        self.controller2 = state.controller2.clone();
    }
}

impl Bus for SystemBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[addr as usize % RAM_SIZE],

            0x2000..=0x3FFF => {
                let Self { ppu, mapper, .. } = self;
                ppu.read_register(addr, |a| mapper.read_chr(a))
            }

            0x4015 => self.apu.read_status(),
            0x4016 => self.controller1.read() | (self.open_bus & 0xE0),
            0x4017 => self.controller2.read() | (self.open_bus & 0xE0),

            // Write-only APU registers and the test range float.
            0x4000..=0x4014 | 0x4018..=0x401F => self.open_bus,

            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        };

        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;

        match addr {
            0x0000..=0x1FFF => self.ram[addr as usize % RAM_SIZE] = value,

            0x2000..=0x3FFF => {
                let Self { ppu, mapper, .. } = self;
                ppu.write_register(addr, value, |a, v| mapper.write_chr(a, v));
            }

            0x4014 => self.oam_dma(value),

            0x4016 => {
                // One strobe line feeds both ports.
                self.controller1.write_strobe(value);
                self.controller2.write_strobe(value);
            }

            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, value),

            0x4018..=0x401F => {}

            0x4020..=0xFFFF => self.mapper.write_prg(addr, value),
        }
    }

    /// Side-effect-free read for disassembly and save-state tooling.
    /// PPUSTATUS, $4015, and the controller ports are routed through their
    /// peek paths so no latch or flag changes.
    fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[addr as usize % RAM_SIZE],
            0x2000..=0x3FFF => self.ppu.peek_register(addr),
            0x4015 => self.apu.peek_status(),
            0x4016 => self.controller1.peek() | (self.open_bus & 0xE0),
            0x4017 => self.controller2.peek() | (self.open_bus & 0xE0),
            0x4000..=0x4014 | 0x4018..=0x401F => self.open_bus,
            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use famicore_apu::Region;
    use famicore_mappers::{build_mapper, Cartridge, PRG_BANK_SIZE};

    fn test_rom(prg_banks: u8) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A];
        data.push(prg_banks);
        data.push(1);
        data.extend_from_slice(&[0; 10]);
        data.extend(std::iter::repeat(0xEA).take(usize::from(prg_banks) * PRG_BANK_SIZE));
        data.extend(std::iter::repeat(0u8).take(0x2000));
        data
    }

    fn test_bus() -> SystemBus {
        let cart = Cartridge::from_ines(&test_rom(2)).unwrap();
        let mapper = build_mapper(cart).unwrap();
        SystemBus::new(mapper, Apu::new(Region::Ntsc))
    }

    #[test]
    fn ram_mirrors_every_0x800() {
        let mut bus = test_bus();
        bus.write(0x0000, 0x42);
        assert_eq!(bus.read(0x0000), 0x42);
        assert_eq!(bus.read(0x0800), 0x42);
        assert_eq!(bus.read(0x1000), 0x42);
        assert_eq!(bus.read(0x1800), 0x42);

        bus.write(0x1234, 0xAB);
        assert_eq!(bus.read(0x0234), 0xAB);
    }

    #[test]
    fn ppu_registers_mirror_every_8() {
        let mut bus = test_bus();
        // $2006 is register 6 at any mirror.
        bus.write(0x3FF6, 0x21);
        bus.write(0x2006, 0x00);
        bus.write(0x2007, 0x55);
        bus.write(0x3FF6, 0x21);
        bus.write(0x2006, 0x00);
        let _ = bus.read(0x2007);
        assert_eq!(bus.read(0x2007), 0x55);
    }

    #[test]
    fn cartridge_window_reaches_mapper() {
        let mut bus = test_bus();
        assert_eq!(bus.read(0x8000), 0xEA);
        assert_eq!(bus.read(0xFFFF), 0xEA);
    }

    #[test]
    fn open_bus_on_undriven_reads() {
        let mut bus = test_bus();
        bus.write(0x0000, 0x5A);
        let _ = bus.read(0x0000);
        assert_eq!(bus.read(0x4018), 0x5A, "test range floats to last value");
        assert_eq!(bus.read(0x4002), 0x5A, "write-only APU register floats");
    }

    #[test]
    fn oam_dma_copies_and_stalls() {
        let mut bus = test_bus();
        for i in 0..256u16 {
            bus.write(0x0200 + i, i as u8);
        }

        bus.write(0x4014, 0x02);
        let stall = bus.take_pending_stall();
        assert!(stall == 513 || stall == 514);

        // OAM now holds the page: read back through OAMDATA.
        bus.write(0x2003, 0x00);
        for i in 0..4u8 {
            bus.write(0x2003, i);
            let expected = if i % 4 == 2 { i & 0xE3 } else { i };
            assert_eq!(bus.read(0x2004), expected);
        }
    }

    #[test]
    fn oam_dma_parity_changes_stall() {
        let mut bus = test_bus();
        bus.write(0x4014, 0x00);
        assert_eq!(bus.take_pending_stall(), 513, "even cycle count");

        bus.tick(1);
        bus.write(0x4014, 0x00);
        assert_eq!(bus.take_pending_stall(), 514, "odd cycle count");
    }

    #[test]
    fn controllers_share_strobe() {
        let mut bus = test_bus();
        bus.controller1_mut().set_buttons(0x01);
        bus.controller2_mut().set_buttons(0x02);
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);

        assert_eq!(bus.read(0x4016) & 1, 1); // port 1 A
        assert_eq!(bus.read(0x4017) & 1, 0); // port 2 A
        assert_eq!(bus.read(0x4017) & 1, 1); // port 2 B
    }

    #[test]
    fn tick_advances_ppu_three_dots_per_cycle() {
        let mut bus = test_bus();
        let before = u32::from(bus.ppu.scanline()) * 341 + u32::from(bus.ppu.dot());
        bus.tick(10);
        let after = u32::from(bus.ppu.scanline()) * 341 + u32::from(bus.ppu.dot());
        assert_eq!(after - before, 30);
        assert_eq!(bus.apu.cycles(), 10);
    }

    #[test]
    fn peek_does_not_disturb_ppu_status() {
        let mut bus = test_bus();
        // Reach vblank.
        while !bus.ppu.in_vblank() {
            bus.tick(1);
        }
        let peeked = bus.peek(0x2002);
        assert_eq!(peeked & 0x80, 0x80);
        assert!(bus.ppu.in_vblank(), "peek left the flag set");

        let read = bus.read(0x2002);
        assert_eq!(read & 0x80, 0x80);
        assert!(!bus.ppu.in_vblank(), "real read cleared it");
    }

    #[test]
    fn frame_complete_latches() {
        let mut bus = test_bus();
        // One frame is 89342 dots; 29781 CPU cycles covers it.
        for _ in 0..29_800 {
            bus.tick(1);
        }
        assert!(bus.take_frame_complete());
        assert!(!bus.take_frame_complete(), "latch cleared on take");
    }
}
