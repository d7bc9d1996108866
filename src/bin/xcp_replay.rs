//-----------------------------------------------------------------------------
// xcp-replay - replays a recorded .xmraw log file
//
// Run:
// cargo r --bin xcp-replay -- -h

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use xcp_core::log::LogReplayDecoder;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log level (Off=0, Error=1, Warn=2, Info=3, Debug=4, Trace=5)
    #[arg(short, long, default_value_t = 3)]
    log_level: u8,

    /// Path to the .xmraw log file to replay
    file: PathBuf,

    /// Only print completions for this DAQ list number
    #[arg(short, long)]
    daq: Option<u16>,
}

trait ToLogLevelFilter {
    fn to_log_level_filter(self) -> log::LevelFilter;
}

impl ToLogLevelFilter for u8 {
    fn to_log_level_filter(self) -> log::LevelFilter {
        match self {
            0 => log::LevelFilter::Off,
            1 => log::LevelFilter::Error,
            2 => log::LevelFilter::Warn,
            3 => log::LevelFilter::Info,
            4 => log::LevelFilter::Debug,
            5 => log::LevelFilter::Trace,
            _ => log::LevelFilter::Warn,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(args.log_level.to_log_level_filter())
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    info!("opening {:?}", args.file);
    let mut decoder = LogReplayDecoder::open(&args.file)?;
    info!("{} DAQ lists in metadata", decoder.parameters().daq_lists.len());

    let mut printed = 0u64;
    decoder.run(|(daq_num, ts0, ts1, values)| {
        if let Some(filter) = args.daq {
            if daq_num != filter {
                return;
            }
        }
        println!("daq={daq_num} t0={ts0} t1={ts1} values={values:?}");
        printed += 1;
    })?;

    if printed == 0 {
        warn!("no DAQ lists matched");
    }
    info!("replayed {} completed DAQ lists", printed);
    Ok(())
}
