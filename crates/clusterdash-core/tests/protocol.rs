use clusterdash_core::protocol::{
    parse_line, Command, DecodedLine, LineDecoder, MemoryChannel, OutboundMessage, ProtocolError,
    TelemetryFrame, HIGH_WATER_MARK,
};
use pretty_assertions::assert_eq;

fn expect_frame(line: Option<DecodedLine>) -> TelemetryFrame {
    match line {
        Some(DecodedLine::Frame(frame)) => frame,
        other => panic!("expected frame, got {:?}", other),
    }
}

#[test]
fn test_protocol_error_display() {
    let err = ProtocolError::SerialError("No such file or directory".into());
    assert!(err.to_string().starts_with("Serial port error"));

    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
    let err: ProtocolError = io.into();
    assert!(err.to_string().contains("gone"));
}

#[test]
fn test_high_frequency_frame() {
    let frame = expect_frame(parse_line(
        "SPEED:55.3,RPM:2450,TRIP_BTN:0,AVG_BTN:0,BRIGHTNESS:80",
    ));
    assert_eq!(frame.speed, Some(55.3));
    assert_eq!(frame.rpm, Some(2450.0));
    assert_eq!(frame.buttons(), Some((false, false)));
    assert_eq!(frame.brightness, Some(80.0));
}

#[test]
fn test_low_frequency_frame() {
    let frame = expect_frame(parse_line(
        "FUEL:62,OIL:38,COOLANT:192,OILTEMP:210,BATTERY:13.8,FUELRNG:240,IMPG:0,AMPG:21.4,FLOW:0.7,\
         OIL_P_SW:1,OIL_T_SW:0,COOL_SW:1,VOLT_SW:0,FUELR_SW:1,TRIP_SW:0,IMPG_SW:1,AMPG_SW:1,METR_SW:0",
    ));
    assert_eq!(frame.fuel_level, Some(62.0));
    assert_eq!(frame.battery_voltage, Some(13.8));
    assert_eq!(frame.fuel_range, Some(240.0));
    assert_eq!(frame.instant_mpg, Some(0.0));
    assert_eq!(frame.average_mpg, Some(21.4));
    assert_eq!(frame.switches.oil_pressure, Some(true));
    assert_eq!(frame.switches.metric, Some(false));
    assert_eq!(frame.speed, None);
}

#[test]
fn test_odometer_snapshot_needs_all_three() {
    let frame = expect_frame(parse_line("TOTAL_ODO:100.5,TRIP_ODO:3.2"));
    assert_eq!(frame.odometer_snapshot(), None);

    let frame = expect_frame(parse_line("TOTAL_ODO:100.5,TRIP_ODO:3.2,FUEL_USED:0.4"));
    assert_eq!(frame.odometer_snapshot(), Some((100.5, 3.2, 0.4)));
}

#[test]
fn test_command_is_not_a_frame() {
    // A command line containing pair-like text still decodes as the command
    assert_eq!(
        parse_line("RESET_TRIP:SPEED:30"),
        Some(DecodedLine::Command(Command::ResetTrip))
    );
}

#[test]
fn test_garbage_then_valid_line_yields_one_frame() {
    let channel = MemoryChannel::new();
    let mut reader = channel.clone();
    let mut decoder = LineDecoder::new();

    channel.feed(&vec![b'#'; HIGH_WATER_MARK + 1]);
    assert_eq!(decoder.poll(&mut reader).unwrap(), None);

    channel.feed_str("SPEED:30\n");
    let mut frames = Vec::new();
    for _ in 0..5 {
        if let Some(line) = decoder.poll(&mut reader).unwrap() {
            frames.push(expect_frame(Some(line)));
        }
    }
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].speed, Some(30.0));
    assert_eq!(decoder.stats().overflows, 1);
}

#[test]
fn test_exactly_high_water_mark_is_kept() {
    let channel = MemoryChannel::new();
    let mut reader = channel.clone();
    let mut decoder = LineDecoder::new();

    let mut line = "SPEED:12,".to_string();
    while line.len() < HIGH_WATER_MARK - 1 {
        line.push('X');
    }
    line.push('\n');
    assert_eq!(line.len(), HIGH_WATER_MARK);

    channel.feed_str(&line);
    let frame = expect_frame(decoder.poll(&mut reader).unwrap());
    assert_eq!(frame.speed, Some(12.0));
    assert_eq!(decoder.stats().overflows, 0);
}

#[test]
fn test_crlf_line_endings() {
    let channel = MemoryChannel::new();
    let mut reader = channel.clone();
    let mut decoder = LineDecoder::new();

    channel.feed_str("RPM:1800\r\nSTYLE_CHANGE:\r\n");
    let frame = expect_frame(decoder.poll(&mut reader).unwrap());
    assert_eq!(frame.rpm, Some(1800.0));
    assert_eq!(
        decoder.poll(&mut reader).unwrap(),
        Some(DecodedLine::Command(Command::StyleChange))
    );
}

#[test]
fn test_read_failure_surfaces_as_error() {
    let channel = MemoryChannel::new();
    let mut reader = channel.clone();
    let mut decoder = LineDecoder::new();

    channel.fail_reads(true);
    assert!(matches!(
        decoder.poll(&mut reader),
        Err(ProtocolError::IoError(_))
    ));
}

#[test]
fn test_outbound_wire_format() {
    let channel = MemoryChannel::new();
    let mut writer = channel.clone();

    OutboundMessage::InitData {
        fuel_used: 12.34567,
        fuel_used_secondary: 0.0,
    }
    .send(&mut writer)
    .unwrap();
    OutboundMessage::AvgMpgUpdate(50.0).send(&mut writer).unwrap();

    assert_eq!(
        channel.take_written(),
        "INIT_DATA:12.3457,0.0000\nAVG_MPG_UPDATE:50.0\n"
    );
}
