use std::net::Ipv4Addr;

use clap::Parser;
use tpi_client::{
    client::{ReceiverOptions, TpiReceiver},
    protocol::types::{ObjectKind, Scheme},
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "192.168.1.10")]
    addr: Ipv4Addr,
    #[arg(short, long)]
    user: Option<String>,
    #[arg(short, long)]
    password: Option<String>,
    #[arg(long)]
    https: bool,
    /// Objects whose raw `show` body is printed, e.g. `ephemeris`
    objects: Vec<String>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut options = ReceiverOptions::new(args.addr.to_string());
    if args.https {
        options = options.scheme(Scheme::Https);
    }
    if let (Some(user), Some(password)) = (&args.user, &args.password) {
        options = options.credentials(user, password);
    }

    let receiver = match TpiReceiver::connect(&options).await {
        Ok(receiver) => receiver,
        Err(e) => {
            eprintln!("Failed to connect: {e}");
            return;
        }
    };

    println!(
        "Receiver: {} (sn {})",
        receiver.receiver_type().unwrap_or("unknown"),
        receiver.serial_number().unwrap_or("unknown")
    );
    if let Some(firmware) = receiver.firmware_version() {
        println!("Firmware: {} ({})", firmware.version, firmware.date);
    }
    println!("Antenna types: {}", receiver.antenna_types().len());

    match receiver.utc_time().await {
        Ok(time) => println!("UTC time: {time}"),
        Err(e) => eprintln!("UTC time: {e}"),
    }
    match receiver.gps_time().await {
        Ok(time) => println!("GPS time: {time}"),
        Err(e) => eprintln!("GPS time: {e}"),
    }
    match receiver.position().await {
        Ok(fix) => println!(
            "Position: {:.7}, {:.7}, {:.3} m, {} satellites, PDOP {:.1}",
            fix.latitude,
            fix.longitude,
            fix.altitude,
            fix.satellites.len(),
            fix.pdop
        ),
        Err(e) => eprintln!("Position: {e}"),
    }
    match receiver.voltages().await {
        Ok(readings) => {
            for reading in readings {
                println!("Voltage: {reading}");
            }
        }
        Err(e) => eprintln!("Voltages: {e}"),
    }
    match receiver.temperature().await {
        Ok(temp) => println!("Temperature: {temp:.1} C"),
        Err(e) => eprintln!("Temperature: {e}"),
    }

    for name in &args.objects {
        let Some(object) = ObjectKind::from_name(name) else {
            eprintln!("Unknown object: {name}");
            continue;
        };
        match receiver.show_raw(object).await {
            Ok(body) => println!("{}:\n{}", object, body.trim_end()),
            Err(e) => eprintln!("{object}: {e}"),
        }
    }
}
