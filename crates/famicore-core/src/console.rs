//! The console coordinator.
//!
//! Drives the per-instruction loop: step the CPU once, then advance the
//! PPU by three dots per CPU cycle, the APU by one cycle each, and the
//! mapper alongside. Interrupts, DMA stalls, and frame completion travel
//! through the bus between iterations, so within one iteration the CPU
//! instruction is fully observable before the other units see it.

use famicore_apu::{Apu, Region};
use famicore_cpu::{Cpu, CpuError, OpcodeMode};
use famicore_mappers::{build_mapper, Cartridge, RomError};
use famicore_ppu::{FRAME_HEIGHT, FRAME_WIDTH};

use crate::bus::SystemBus;
use crate::host::{AudioSink, InputSource, SramStore, VideoSink};
use crate::palette::palette_rgba;
use crate::save_state::{SaveState, SaveStateError};

/// NTSC timing constants.
pub mod timing {
    /// Master clock (NTSC).
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock: master / 12.
    pub const CPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 12;
    /// PPU clock: master / 4.
    pub const PPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 4;
    /// CPU cycles per frame, rounded.
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_780;
}

/// Construction-time options.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Fail on unsupported opcodes instead of running them as NOPs.
    pub strict_opcodes: bool,
    /// Audio output rate in Hz.
    pub audio_sample_rate: u32,
    /// Keep channel state machines running but emit no samples.
    pub disable_audio: bool,
    /// Console region.
    pub region: Region,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            strict_opcodes: true,
            audio_sample_rate: 44_100,
            disable_audio: false,
            region: Region::Ntsc,
        }
    }
}

/// Console errors.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The cartridge could not be loaded.
    #[error("cartridge error: {0}")]
    Cartridge(#[from] RomError),

    /// The CPU hit an unsupported opcode in strict mode.
    #[error("CPU fault: {0}")]
    Cpu(#[from] CpuError),

    /// Save-state load or store failed; emulator state is unchanged.
    #[error("save state error: {0}")]
    SaveState(#[from] SaveStateError),
}

/// The NES console.
pub struct Console {
    cpu: Cpu,
    bus: SystemBus,
    config: CoreConfig,
    /// RGBA framebuffer, converted from the PPU's palette indices.
    framebuffer: Vec<u32>,
    frame_count: u64,
    running: bool,
}

impl Console {
    /// Build a console from raw `.nes` file contents with default options.
    pub fn new(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        Self::with_config(rom_data, CoreConfig::default())
    }

    /// Build a console with explicit options.
    pub fn with_config(rom_data: &[u8], config: CoreConfig) -> Result<Self, ConsoleError> {
        let cart = Cartridge::from_ines(rom_data)?;
        let mapper = build_mapper(cart)?;

        let apu = Apu::with_sample_rate(
            config.region,
            config.audio_sample_rate,
            !config.disable_audio,
        );
        let bus = SystemBus::new(mapper, apu);

        let opcode_mode = if config.strict_opcodes {
            OpcodeMode::Strict
        } else {
            OpcodeMode::Lenient
        };

        let mut console = Self {
            cpu: Cpu::with_opcode_mode(opcode_mode),
            bus,
            config,
            framebuffer: vec![0; FRAME_WIDTH * FRAME_HEIGHT],
            frame_count: 0,
            running: true,
        };
        console.cpu.reset(&mut console.bus);
        // The reset sequence costs 7 CPU cycles; keep the other units in
        // ratio from the very first instruction.
        console.bus.tick(7);
        Ok(console)
    }

    /// Reset the machine (the console reset button, not power off).
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.mapper.reset();
        self.bus.tick(7);
        self.running = true;
    }

    /// Execute one CPU step (instruction, interrupt entry, or stall cycle)
    /// and bring the PPU, APU, and mapper up to the same point in time.
    pub fn step(&mut self) -> Result<u8, ConsoleError> {
        if self.bus.take_nmi_edge() {
            self.cpu.trigger_nmi();
        }
        self.cpu.set_irq(self.bus.irq_line());

        let stall = self.bus.take_pending_stall();
        if stall > 0 {
            self.cpu.add_stall(stall);
        }

        let cycles = self.cpu.step(&mut self.bus)?;
        self.bus.tick(cycles);
        Ok(cycles)
    }

    /// Run until the PPU completes the current frame, then convert the
    /// framebuffer. Returns the CPU cycles consumed.
    pub fn step_frame(&mut self) -> Result<u64, ConsoleError> {
        let start = self.cpu.cycles;
        while self.running {
            self.step()?;
            if self.bus.take_frame_complete() {
                break;
            }
        }
        self.refresh_framebuffer();
        self.frame_count += 1;
        Ok(self.cpu.cycles - start)
    }

    /// Drive one frame against a host: input is sampled before the frame,
    /// video and audio are delivered after.
    pub fn run_frame<H>(&mut self, host: &mut H) -> Result<(), ConsoleError>
    where
        H: VideoSink + AudioSink + InputSource,
    {
        let buttons = host.before_frame();
        self.bus.controller1_mut().set_buttons(buttons[0]);
        self.bus.controller2_mut().set_buttons(buttons[1]);

        self.step_frame()?;

        host.present_frame(&self.framebuffer);
        let samples = self.bus.apu.take_samples();
        if !samples.is_empty() {
            host.push_samples(&samples, self.config.audio_sample_rate);
        }
        Ok(())
    }

    fn refresh_framebuffer(&mut self) {
        for (dst, &index) in self.framebuffer.iter_mut().zip(self.bus.ppu.frame_buffer()) {
            *dst = palette_rgba(index);
        }
    }

    /// The last completed frame as RGBA8888 words.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// Drain accumulated audio samples.
    pub fn take_audio(&mut self) -> Vec<f32> {
        self.bus.apu.take_samples()
    }

    /// Frames completed so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total CPU cycles executed.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// True until [`Console::pause`] is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the frame loop at the next iteration boundary.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume after a pause.
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// CPU access for tests and debuggers.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutable CPU access (test harnesses position the PC).
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Bus access for tests and debuggers.
    #[must_use]
    pub fn bus(&self) -> &SystemBus {
        &self.bus
    }

    /// Mutable bus access.
    pub fn bus_mut(&mut self) -> &mut SystemBus {
        &mut self.bus
    }

    /// Read a byte without side effects (disassembly, save-state tooling).
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        use famicore_cpu::Bus;
        self.bus.peek(addr)
    }

    /// The loaded cartridge.
    #[must_use]
    pub fn cartridge(&self) -> &Cartridge {
        self.bus.mapper.cartridge()
    }

    /// Load battery RAM from the host's store, if it has any for this
    /// cartridge.
    pub fn load_sram<S: SramStore>(&mut self, store: &mut S) {
        let hash = *self.cartridge().hash();
        if let Some(data) = store.load(&hash) {
            self.bus.mapper.cartridge_mut().load_sram(&data);
            log::debug!("loaded {} bytes of SRAM", data.len());
        }
    }

    /// Persist battery RAM through the host's store. Failures are logged
    /// and ignored.
    pub fn save_sram<S: SramStore>(&mut self, store: &mut S) {
        if !self.cartridge().has_battery() {
            return;
        }
        let hash = *self.cartridge().hash();
        let data = self.cartridge().sram().to_vec();
        if let Err(err) = store.save(&hash, &data) {
            log::warn!("failed to persist SRAM: {err}");
        }
    }

    /// Snapshot the complete machine state.
    #[must_use]
    pub fn save_state(&self) -> SaveState {
        let cart = self.cartridge();
        SaveState {
            cartridge_hash: *cart.hash(),
            cpu: self.cpu.save_state(),
            ppu: self.bus.ppu.save_state(),
            apu: self.bus.apu.clone(),
            bus: self.bus.save_state(),
            sram: cart.sram().to_vec(),
            chr_ram: if cart.chr_writable() {
                cart.chr().to_vec()
            } else {
                Vec::new()
            },
            mapper: self.bus.mapper.save_state(),
            frame_count: self.frame_count,
        }
    }

    /// Restore a snapshot. Validation happens before any mutation, so a
    /// failed load leaves the running state untouched.
    pub fn load_state(&mut self, state: &SaveState) -> Result<(), ConsoleError> {
        if state.cartridge_hash != *self.cartridge().hash() {
            return Err(SaveStateError::CartridgeMismatch.into());
        }

        self.cpu.load_state(&state.cpu);
        self.bus.ppu.load_state(&state.ppu);
        self.bus.apu = state.apu.clone();
        self.bus.load_state(&state.bus);
        self.bus.mapper.load_state(&state.mapper);
        {
            let cart = self.bus.mapper.cartridge_mut();
            cart.load_sram(&state.sram);
            if !state.chr_ram.is_empty() {
                cart.load_chr_ram(&state.chr_ram);
            }
        }
        self.frame_count = state.frame_count;
        log::debug!("restored save state at frame {}", state.frame_count);
        Ok(())
    }

    /// Serialize the current state as a framed blob.
    pub fn save_state_bytes(&self) -> Result<Vec<u8>, ConsoleError> {
        Ok(self.save_state().to_bytes()?)
    }

    /// Restore from a framed blob.
    pub fn load_state_bytes(&mut self, bytes: &[u8]) -> Result<(), ConsoleError> {
        let state = SaveState::from_bytes(bytes)?;
        self.load_state(&state)
    }
}
