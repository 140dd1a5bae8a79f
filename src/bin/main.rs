use cl_log::{level::Level, write_options::WriteOptions, Logger};
use cl_timerfd::{
    events::{EventPoller, InterestType},
    BufferedReader,
    Receive,
    TimerBuilder,
    timing::COUNTER_WIDTH,
};
use log::{error, info, warn};

const DEFAULT_DELAY: f64 = 0.5;
const DEFAULT_INTERVAL: f64 = 0.25;
const DEFAULT_TICKS: u64 = 8;

struct Args {
    delay: f64,
    interval: f64,
    ticks: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        delay: DEFAULT_DELAY,
        interval: DEFAULT_INTERVAL,
        ticks: DEFAULT_TICKS,
    };

    if let Some(delay) = args.next() {
        parsed.delay = delay.parse().map_err(|e| format!("bad delay '{}': {}", delay, e))?;
    }
    if let Some(interval) = args.next() {
        parsed.interval = interval.parse().map_err(|e| format!("bad interval '{}': {}", interval, e))?;
    }
    if let Some(ticks) = args.next() {
        parsed.ticks = ticks.parse().map_err(|e| format!("bad tick count '{}': {}", ticks, e))?;
    }
    Ok(parsed)
}

fn run(args: Args) -> cl_timerfd::Result<()> {
    let timer = TimerBuilder::new()
        .delay(args.delay)
        .interval(args.interval)
        .build()?;
    info!("{} started at {:.3}s", timer, timer.start_time());

    let mut poller = EventPoller::new(16)?;
    let key = poller.register(&timer, InterestType::READ)?;
    let mut reader = BufferedReader::new(&timer);
    let mut events = Vec::new();
    let mut ticks = 0u64;

    while ticks < args.ticks {
        poller.poll_events(&mut events, Some(5_000))?;
        if events.is_empty() {
            warn!("no expiration within 5s, giving up");
            break;
        }

        for event in events.iter().filter(|event| event.key == key) {
            match reader.receive(COUNTER_WIDTH)? {
                Receive::Complete(bytes) => {
                    let mut counter = [0u8; COUNTER_WIDTH];
                    counter.copy_from_slice(&bytes);
                    let fired = u64::from_ne_bytes(counter);
                    ticks += fired;
                    info!(
                        "{} fired {} time(s) ({}), {:.3}s elapsed",
                        timer,
                        fired,
                        event.event_type,
                        timer.elapsed()
                    );
                },
                Receive::Pending => {},
                Receive::Closed(_) => {
                    warn!("{} closed while polling", timer);
                    return Ok(());
                }
            }
        }
    }

    poller.deregister(key)?;
    timer.close();
    info!("done after {} tick(s), {}", ticks, timer);
    Ok(())
}

fn main() {

    let opt = Some(WriteOptions::EXPANDED);
    let err_opt = Some(WriteOptions::ALL);

    match Logger::builder()
        .with_stderr(Level::Error, err_opt)
        .with_stdout(Level::Warn, opt)
        .with_stdout(Level::Info, opt)
    .build() {
        Ok(_) => {},
        Err(err) => {
            eprintln!("Failed to initialize logger: {}", err);
            std::process::exit(1);
        }
    }

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            error!("{}", e);
            eprintln!("usage: cl-timerfd [delay-seconds] [interval-seconds] [ticks]");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
