//! CSR command protocol and plain register stores, driven through the
//! register interface the way the CPU would.

use next_dma::csr::{
    CLRCOMPLETE, COMPLETE, DEV2M, ENABLE, INITBUF, RESET, SETENABLE, SETSUPDATE, SUPDATE,
};
use next_dma::testing::{IrqEvent, TestHost};
use next_dma::{
    Channel, ChannelId, Csr, Direction, DmaConfig, DmaController, InterruptLine, MachineType,
    Register,
};

const IO_BASE: u32 = 0x0200_0000;

fn addr(register: Register, id: ChannelId) -> u32 {
    IO_BASE | register.offset(id)
}

fn controller(machine: MachineType) -> DmaController {
    DmaController::new(DmaConfig {
        machine,
        turbo: false,
    })
}

fn write(
    dma: &mut DmaController,
    host: &mut TestHost,
    register: Register,
    id: ChannelId,
    value: u32,
) {
    dma.write_register(host, register, addr(register, id), value);
}

fn busy_csr() -> Csr {
    Csr {
        direction: Direction::DeviceToMem,
        enable: true,
        single_update: true,
        complete: true,
        bus_exception: false,
    }
}

#[test]
fn reset_always_returns_channel_to_idle() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);

    for id in ChannelId::ALL {
        let mut state = dma.channel_state(id);
        state.csr = busy_csr();
        dma.restore_channel(id, state);

        // Even with DEV2M in the same write, RESET wins.
        write(&mut dma, &mut host, Register::Csr, id, RESET | DEV2M);

        let csr = dma.channel(id).csr;
        assert!(!csr.complete, "{id:?}");
        assert!(!csr.single_update, "{id:?}");
        assert!(!csr.enable, "{id:?}");
        assert_eq!(csr.direction, Direction::MemToDevice, "{id:?}");
    }
}

#[test]
fn init_buffers_empties_staging_and_device_counter() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);

    write(&mut dma, &mut host, Register::Next, ChannelId::Scsi, 0x1000);
    write(&mut dma, &mut host, Register::Limit, ChannelId::Scsi, 0x1010);
    host.disk.feed([1, 2, 3, 4, 5]);
    dma.storage_commit(&mut host);
    assert_eq!(dma.staged_bytes(), 5);
    assert_eq!(host.disk.transferred, 5);
    host.disk.status = 0x55;

    write(&mut dma, &mut host, Register::Csr, ChannelId::Scsi, INITBUF);

    assert_eq!(dma.staged_bytes(), 0);
    assert_eq!(host.disk.transferred, 0);
    assert_eq!(host.disk.status, 0);
    // INITBUF alone leaves the status bits alone.
    assert_eq!(dma.channel(ChannelId::Scsi).next, 0x1000);
}

#[test]
fn reset_and_init_buffers_does_both() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);

    let mut state = dma.channel_state(ChannelId::Scsi);
    state.csr = busy_csr();
    state.next = 0x1000;
    state.limit = 0x1010;
    dma.restore_channel(ChannelId::Scsi, state);
    host.disk.feed([9; 3]);
    dma.storage_commit(&mut host);
    assert_eq!(dma.staged_bytes(), 3);

    write(&mut dma, &mut host, Register::Csr, ChannelId::Scsi, RESET | INITBUF);

    assert_eq!(dma.staged_bytes(), 0);
    assert_eq!(host.disk.transferred, 0);
    let csr = dma.channel(ChannelId::Scsi).csr;
    assert!(!csr.enable && !csr.single_update && !csr.complete);
}

#[test]
fn enable_and_chaining_commands() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);
    let id = ChannelId::SoundOut;

    write(&mut dma, &mut host, Register::Csr, id, SETENABLE);
    assert!(dma.channel(id).csr.enable);
    assert!(!dma.channel(id).csr.single_update);

    write(&mut dma, &mut host, Register::Csr, id, RESET);
    write(&mut dma, &mut host, Register::Csr, id, SETENABLE | SETSUPDATE);
    assert!(dma.channel(id).csr.enable);
    assert!(dma.channel(id).csr.single_update);

    let mut state = dma.channel_state(id);
    state.csr.complete = true;
    state.csr.single_update = false;
    dma.restore_channel(id, state);

    write(&mut dma, &mut host, Register::Csr, id, SETSUPDATE | CLRCOMPLETE);
    assert!(dma.channel(id).csr.single_update);
    assert!(!dma.channel(id).csr.complete);

    let mut state = dma.channel_state(id);
    state.csr.complete = true;
    dma.restore_channel(id, state);

    write(&mut dma, &mut host, Register::Csr, id, CLRCOMPLETE);
    assert!(!dma.channel(id).csr.complete);
    // Clear complete leaves chaining armed.
    assert!(dma.channel(id).csr.single_update);
}

#[test]
fn direction_is_stored_with_any_command() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);
    let id = ChannelId::EnRx;
    let csr = addr(Register::Csr, id);

    dma.write_register(&mut host, Register::Csr, csr, DEV2M | SETENABLE);
    assert_eq!(dma.read_register(Register::Csr, csr), DEV2M | ENABLE);

    dma.write_register(&mut host, Register::Csr, csr, DEV2M);
    assert_eq!(dma.channel(id).csr.direction, Direction::DeviceToMem);

    dma.write_register(&mut host, Register::Csr, csr, 0);
    assert_eq!(dma.channel(id).csr.direction, Direction::MemToDevice);
    assert!(dma.channel(id).csr.enable);
}

#[test]
fn unknown_command_changes_nothing() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);
    let id = ChannelId::Printer;

    let mut state = dma.channel_state(id);
    state.csr = Csr {
        direction: Direction::MemToDevice,
        ..busy_csr()
    };
    state.next = 0x1234;
    dma.restore_channel(id, state);

    write(&mut dma, &mut host, Register::Csr, id, SETENABLE | RESET);
    write(&mut dma, &mut host, Register::Csr, id, SETSUPDATE);
    write(&mut dma, &mut host, Register::Csr, id, INITBUF | CLRCOMPLETE | SETENABLE);

    assert_eq!(dma.channel_state(id), state);
}

#[test]
fn every_csr_write_releases_the_channel_interrupt() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);

    for id in ChannelId::ALL {
        let Some(line) = id.interrupt() else {
            continue;
        };
        host.irq_status = line.mask();
        host.irq_events.clear();

        write(&mut dma, &mut host, Register::Csr, id, SETENABLE);

        assert!(!host.asserted(line), "{id:?}");
        assert_eq!(host.irq_events, vec![IrqEvent::Release(line)], "{id:?}");
    }
}

#[test]
fn video_csr_write_leaves_interrupts_alone() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);

    write(&mut dma, &mut host, Register::Csr, ChannelId::Video, SETENABLE);

    assert!(dma.channel(ChannelId::Video).csr.enable);
    assert!(host.irq_events.is_empty());
}

#[test]
fn cube030_uses_byte_wide_csr() {
    let mut dma = controller(MachineType::Cube030);
    let mut host = TestHost::new(0);
    let csr = addr(Register::Csr, ChannelId::Disk);

    // SETENABLE | DEV2M in the 68030 layout.
    dma.write_register(&mut host, Register::Csr, csr, 0x05);
    let state = dma.channel(ChannelId::Disk).csr;
    assert!(state.enable);
    assert_eq!(state.direction, Direction::DeviceToMem);
    assert_eq!(dma.read_register(Register::Csr, csr), 0x05);

    // SETSUPDATE | CLRCOMPLETE
    dma.write_register(&mut host, Register::Csr, csr, 0x0A);
    assert_eq!(dma.read_register(Register::Csr, csr), 0x03);

    // RESET
    dma.write_register(&mut host, Register::Csr, csr, 0x10);
    assert_eq!(dma.read_register(Register::Csr, csr), 0x00);
}

#[test]
fn cube040_reads_full_long_word() {
    let mut dma = controller(MachineType::Station);
    let mut host = TestHost::new(0);
    let csr = addr(Register::Csr, ChannelId::Dsp);

    dma.write_register(&mut host, Register::Csr, csr, SETENABLE | SETSUPDATE);
    assert_eq!(dma.read_register(Register::Csr, csr), ENABLE | SUPDATE);

    let mut state = dma.channel_state(ChannelId::Dsp);
    state.csr.complete = true;
    dma.restore_channel(ChannelId::Dsp, state);
    assert_eq!(dma.read_register(Register::Csr, csr), ENABLE | SUPDATE | COMPLETE);
}

#[test]
fn saved_registers_read_back_verbatim() {
    let saved = [
        Register::SavedNext,
        Register::SavedLimit,
        Register::SavedStart,
        Register::SavedStop,
    ];
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);

    for id in ChannelId::ALL {
        for (i, &register) in saved.iter().enumerate() {
            let value = 0x0400_0000 | ((id.index() as u32) << 8) | i as u32;
            write(&mut dma, &mut host, register, id, value);
            assert_eq!(dma.read_register(register, addr(register, id)), value);
        }
        // The live pointers don't mirror the snapshot.
        let channel = dma.channel(id);
        assert_eq!((channel.next, channel.limit, channel.start, channel.stop), (0, 0, 0, 0));
    }
}

#[test]
fn pointer_registers_are_plain_stores() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);
    let id = ChannelId::Scc;

    write(&mut dma, &mut host, Register::Next, id, 0x0400_0100);
    write(&mut dma, &mut host, Register::Limit, id, 0x0400_0200);
    write(&mut dma, &mut host, Register::Start, id, 0x0400_0300);
    write(&mut dma, &mut host, Register::Stop, id, 0x0400_0400);
    write(&mut dma, &mut host, Register::Size, id, 0x80);

    assert_eq!(
        dma.channel_state(id),
        Channel {
            next: 0x0400_0100,
            limit: 0x0400_0200,
            start: 0x0400_0300,
            stop: 0x0400_0400,
            size: 0x80,
            ..Channel::default()
        }
    );
    assert!(host.irq_events.is_empty());
}

#[test]
fn init_write_seeds_next() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);
    let id = ChannelId::EnTx;

    write(&mut dma, &mut host, Register::Next, id, 0x1111);
    write(&mut dma, &mut host, Register::Init, id, 0x2222);

    assert_eq!(dma.read_register(Register::Init, addr(Register::Init, id)), 0x2222);
    assert_eq!(dma.read_register(Register::Next, addr(Register::Next, id)), 0x2222);
}

#[test]
fn accesses_outside_any_channel_are_ignored() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);

    for address in [0x0200_0020, 0x0200_0100, 0x0200_01F0] {
        dma.write_register(&mut host, Register::Csr, address, SETENABLE);
        assert_eq!(dma.read_register(Register::Csr, address), 0);
    }
    dma.write_register(&mut host, Register::Next, IO_BASE | 0x4020, 0xFFFF_FFFF);
    assert_eq!(dma.read_register(Register::Next, IO_BASE | 0x4020), 0);

    for id in ChannelId::ALL {
        assert_eq!(dma.channel_state(id), Channel::default());
    }
    assert!(host.irq_events.is_empty());
}

#[test]
fn clear_complete_on_scsi_commits_staged_bytes() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);
    let id = ChannelId::Scsi;

    write(&mut dma, &mut host, Register::Next, id, 0x1000);
    write(&mut dma, &mut host, Register::Limit, id, 0x1010);
    write(&mut dma, &mut host, Register::Csr, id, DEV2M | SETENABLE);
    host.irq_events.clear();
    host.disk.feed(0x40..0x50);

    write(&mut dma, &mut host, Register::Csr, id, DEV2M | CLRCOMPLETE);

    assert_eq!(host.memory.peek_range(0x1000, 16), (0x40..0x50).collect::<Vec<u8>>());
    let csr = dma.channel(id).csr;
    assert!(csr.complete);
    assert!(!csr.enable);
    // The commit raises the interrupt, then register service releases it.
    assert_eq!(
        host.irq_events,
        vec![
            IrqEvent::Set(InterruptLine::ScsiDma),
            IrqEvent::Release(InterruptLine::ScsiDma)
        ]
    );
    assert!(!host.asserted(InterruptLine::ScsiDma));
    assert_eq!(host.disk.dma_done_calls, 1);
}

#[test]
fn clear_complete_elsewhere_does_not_touch_scsi() {
    let mut dma = controller(MachineType::Cube040);
    let mut host = TestHost::new(0);

    write(&mut dma, &mut host, Register::Next, ChannelId::Scsi, 0x1000);
    write(&mut dma, &mut host, Register::Limit, ChannelId::Scsi, 0x1010);
    host.disk.feed([0xAA; 16]);

    write(&mut dma, &mut host, Register::Csr, ChannelId::Disk, CLRCOMPLETE);

    assert_eq!(host.disk.pending(), 16);
    assert_eq!(host.disk.dma_done_calls, 0);
    assert_eq!(dma.channel(ChannelId::Scsi).next, 0x1000);
}
