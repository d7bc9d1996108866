// cargo bench

use criterion::{criterion_group, criterion_main, Criterion};

use xcp_core::codec::{self, ByteOrder, TypeTag, Value};
use xcp_core::daq::mcobject::{Bin, McObject};
use xcp_core::daq::{DaqList, DaqProcessor, MeasurementParameters, TimestampInfo};
use xcp_core::framing::{ChecksumType, EthernetReceiver, HeaderFormat, SxiReceiver};
use xcp_core::log::LogWriter;

fn codec_bench(c: &mut Criterion) {
    let mut buf = [0u8; 8];
    codec::set(TypeTag::F64, &mut buf, 0, Value::F64(123.456), false).unwrap();

    let mut group = c.benchmark_group("codec");
    group.bench_function("get f64, no swap", |b| {
        b.iter(|| codec::get(TypeTag::F64, &buf, 0, false).unwrap())
    });
    group.bench_function("get f64, swap", |b| {
        b.iter(|| codec::get(TypeTag::F64, &buf, 0, true).unwrap())
    });
    group.bench_function("set u32", |b| {
        b.iter(|| codec::set(TypeTag::U32, &mut buf, 0, Value::U32(0xdead_beef), false).unwrap())
    });
}

fn sxi_framing_bench(c: &mut Criterion) {
    let frame: Vec<u8> = {
        let payload = [0x11u8, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        let mut out = vec![payload.len() as u8];
        out.extend_from_slice(&payload);
        let sum = out.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        out.push(sum);
        out
    };

    c.bench_function("sxi feed one frame (len byte, sum8)", |b| {
        b.iter(|| {
            let mut hits = 0u32;
            let mut recv = SxiReceiver::new(HeaderFormat::LenByte, ChecksumType::Sum8, |_p: &[u8], _dlc, _ctr| {
                hits += 1;
            });
            recv.feed_bytes(&frame);
            hits
        })
    });
}

fn ethernet_framing_bench(c: &mut Criterion) {
    let frame: Vec<u8> = {
        let payload = [0xAAu8; 16];
        let mut out = Vec::new();
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&payload);
        out
    };

    c.bench_function("ethernet feed one frame", |b| {
        b.iter(|| {
            let mut hits = 0u32;
            let mut recv = EthernetReceiver::new(|_p: &[u8], _len, _ctr, _ts| hits += 1);
            recv.feed_bytes(&frame, 0);
            hits
        })
    });
}

fn sample_params() -> MeasurementParameters {
    let u16_entry = McObject::leaf("speed", 2, 0, "U16").unwrap();
    let f32_entry = McObject::leaf("torque", 4, 0, "F32").unwrap();
    let odt0 = McObject::new("odt0", 0, 0, 0, "", vec![u16_entry, f32_entry]).unwrap();
    let mut bin0 = Bin::new(0);
    bin0.entries.push(odt0);
    let mut list = DaqList::new("engine", 1, false, false, 0, 1, false, Vec::new());
    list.set_measurements_opt(vec![bin0]);

    MeasurementParameters {
        byte_order: ByteOrder::Intel,
        id_field_size: 2,
        timestamps_supported: false,
        ts_fixed: false,
        prescaler_supported: false,
        selectable_timestamps: false,
        ts_scale_factor: 1.0,
        ts_size: 0,
        min_daq: 0,
        timestamp_info: TimestampInfo::default(),
        timezone: String::new(),
        daq_lists: vec![list],
        first_pids: vec![0],
    }
}

fn daq_decode_bench(c: &mut Criterion) {
    let params = sample_params();
    let frame: [u8; 8] = [0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x20, 0x41];

    c.bench_function("daq processor feed, single-odt list", |b| {
        b.iter(|| {
            let mut processor = DaqProcessor::new(&params);
            processor.feed(1000, &frame).unwrap()
        })
    });
}

fn log_writer_bench(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.xmraw");
    let payload = [0u8; 64];

    c.bench_function("log writer add_frame, 64-byte payload", |b| {
        let writer = LogWriter::open(&path, 4, 1 << 20, None).unwrap();
        let mut counter: u16 = 0;
        b.iter(|| {
            writer.add_frame(6, counter, counter as u64, &payload);
            counter = counter.wrapping_add(1);
        });
    });
}

criterion_group!(benches, codec_bench, sxi_framing_bench, ethernet_framing_bench, daq_decode_bench, log_writer_bench);
criterion_main!(benches);
