use mbrtu::{Buffer, BufferKind, Error, MemoryModel, Result, RtuConfig, StaticMemory};

/// Behavior every memory model must share, whatever backs it.
fn exercise_contract<M: MemoryModel>(config: &RtuConfig) -> Result<()> {
    let mut memory = M::init(config)?;

    let mut rx: Buffer<M::Bytes> = memory.acquire(BufferKind::Receive, config.rx_capacity)?;
    let tx = memory.acquire(BufferKind::Transmit, config.tx_capacity)?;
    assert_eq!(rx.kind(), BufferKind::Receive);
    assert_eq!(tx.kind(), BufferKind::Transmit);
    assert_eq!(rx.capacity(), config.rx_capacity);
    assert!(rx.is_empty());

    for i in 0..config.rx_capacity {
        rx.push(i as u8)?;
    }
    assert!(rx.is_full());
    assert!(matches!(
        rx.push(0),
        Err(Error::BufferOverrun { capacity }) if capacity == config.rx_capacity
    ));
    assert_eq!(rx.len(), config.rx_capacity);

    let registers = memory.register_table();
    assert_eq!(registers.base(), config.register_base);
    assert_eq!(registers.len(), usize::from(config.register_count));
    registers.write(config.register_base, 0xCAFE)?;
    assert_eq!(memory.registers().read(config.register_base)?, 0xCAFE);

    let past_end = config.register_base + config.register_count;
    assert!(matches!(
        memory.registers().read(past_end),
        Err(Error::OutOfRange { address }) if address == past_end
    ));

    memory.release(rx);
    memory.release(tx);

    // Buffers come back clean after a release.
    let again = memory.acquire(BufferKind::Receive, config.rx_capacity)?;
    assert!(again.is_empty());
    Ok(())
}

fn config() -> RtuConfig {
    RtuConfig {
        rx_capacity: 32,
        tx_capacity: 32,
        register_base: 0x100,
        register_count: 8,
        ..RtuConfig::default()
    }
}

#[test]
fn static_memory_contract() -> Result<()> {
    exercise_contract::<StaticMemory<32, 8>>(&config())
}

#[cfg(feature = "alloc")]
#[test]
fn heap_memory_contract() -> Result<()> {
    exercise_contract::<mbrtu::HeapMemory>(&config())
}

#[test]
fn default_memory_contract() -> Result<()> {
    // The build-time selection must satisfy the same contract.
    let config = RtuConfig {
        register_count: 64,
        ..config()
    };
    exercise_contract::<mbrtu::DefaultMemory>(&config)
}

#[cfg(feature = "alloc")]
#[test]
fn heap_exhaustion_fails_initialization() -> Result<()> {
    use mbrtu::crc::LookupCrc;
    use mbrtu::{HeapMemory, ManualClock, RegisterDispatcher, RtuSlave};

    // Registers need 128 bytes; the budget holds 100.
    let config = RtuConfig {
        register_count: 64,
        heap_budget: Some(100),
        ..RtuConfig::default()
    };
    let err = HeapMemory::init(&config).err();
    assert!(matches!(
        err,
        Some(Error::OutOfMemory {
            requested: 128,
            available: 100
        })
    ));

    // Registers fit, the receive buffer does not: nothing is half built.
    let config = RtuConfig {
        register_count: 8,
        heap_budget: Some(200),
        ..RtuConfig::default()
    };
    let slave: Result<RtuSlave<HeapMemory, ManualClock, RegisterDispatcher, LookupCrc>> =
        RtuSlave::init(&config, ManualClock::new(0), RegisterDispatcher::new(1));
    assert!(matches!(
        slave.err(),
        Some(Error::OutOfMemory {
            requested: 256,
            available: 184
        })
    ));
    Ok(())
}

#[test]
fn static_memory_rejects_what_it_cannot_hold() -> Result<()> {
    let mut memory = StaticMemory::<8, 2>::new(0);
    assert!(matches!(
        memory.acquire(BufferKind::Receive, 1_000),
        Err(Error::OutOfMemory {
            requested: 1_000,
            available: 8
        })
    ));
    assert_eq!(memory.acquire(BufferKind::Receive, 8)?.capacity(), 8);

    let config = RtuConfig {
        rx_capacity: 8,
        tx_capacity: 8,
        register_count: 3,
        ..RtuConfig::default()
    };
    assert!(matches!(
        StaticMemory::<8, 2>::init(&config),
        Err(Error::InvalidConfig(_))
    ));
    Ok(())
}

#[test]
fn register_window_follows_config_not_storage() -> Result<()> {
    // Static storage is larger than the configured window.
    let config = RtuConfig {
        register_count: 8,
        ..config()
    };
    let memory = StaticMemory::<32, 64>::init(&config)?;
    assert_eq!(memory.registers().len(), 8);
    let past_window = config.register_base + 20;
    assert!(matches!(
        memory.registers().read(past_window),
        Err(Error::OutOfRange { address }) if address == past_window
    ));
    exercise_contract::<StaticMemory<32, 64>>(&config)?;

    #[cfg(feature = "alloc")]
    {
        let heap = mbrtu::HeapMemory::init(&config)?;
        assert_eq!(heap.registers().len(), memory.registers().len());
        assert_eq!(
            heap.registers().read(past_window).is_err(),
            memory.registers().read(past_window).is_err()
        );
    }
    Ok(())
}
