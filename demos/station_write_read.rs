fn station_write_read() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use dalarray::{
        array::DataType,
        channel::ChannelKey,
        group::GroupNode,
        hyperslab::Hyperslab,
        station::{self, StationGroup},
        storage::{storage_adapter::usage_log::UsageLogStorageAdapter, store},
    };

    // Create a store
    let store = Arc::new(store::MemoryStore::new());
    let log_writer = Arc::new(parking_lot::Mutex::new(
        // std::io::BufWriter::new(
        std::io::stdout(),
        //    )
    ));
    let store = Arc::new(UsageLogStorageAdapter::new(store, log_writer, || {
        "[usage log] ".to_string()
    }));

    // Create a station group with trigger and position attributes
    let root = GroupNode::open_root(store)?;
    let station = StationGroup::create(&root, "Station001")?;
    station.set_trigger("Unknown", 0.0)?;
    station.set_station_position([3_826_577.1, 461_022.9, 5_064_892.7], "m", "ITRF")?;

    // Create one dataset per dipole, and append frames of samples to each
    let frame_length = 1024u64;
    for rcu_id in 0..4 {
        let key = ChannelKey::new(1, 0, rcu_id)?;
        let mut array = station.create_channel(key, DataType::Int16, 2048)?;
        for frame in 0..3u64 {
            let samples: Vec<i16> = (0..frame_length)
                .map(|i| ((i + frame * frame_length) % 512) as i16 - 256)
                .collect();
            array.write_elements(
                &Hyperslab::new(vec![frame * frame_length], vec![frame_length]),
                &samples,
            )?;
        }
        array.set_attribute(station::TIME, &1_262_304_000u32)?;
        array.set_attribute(station::SAMPLE_NUMBER, &0u32)?;
        array.set_attribute(station::DATA_LENGTH, &(3 * frame_length))?;
        array.set_attribute(station::SAMPLE_FREQUENCY_VALUE, &200.0f64)?;
        array.set_attribute(station::SAMPLE_FREQUENCY_UNIT, "MHz")?;
        println!("Channel {key} has shape {:?}", array.shape());
    }

    println!("The hierarchy is:\n{}", root.hierarchy_tree()?);
    println!("Channel ids: {:?}", station.channel_ids()?);
    println!("Times: {:?}", station.times()?);
    println!("Data lengths: {:?}", station.data_lengths()?);

    // Read a block of samples from every channel
    #[cfg(feature = "ndarray")]
    {
        let block = station.read_block_ndarray::<i16>(1020, 8)?;
        println!("Samples [1020..1028] of every channel:\n{block}");
    }
    #[cfg(not(feature = "ndarray"))]
    {
        let block = station.read_block::<i16>(1020, 8)?;
        println!("Samples [1020..1028] of every channel:\n{block:?}");
    }

    Ok(())
}

fn main() {
    if let Err(err) = station_write_read() {
        println!("{:?}", err);
    }
}
