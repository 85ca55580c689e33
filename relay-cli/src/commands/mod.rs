pub mod manifest;
pub mod publish;
pub mod update;
pub mod verify;

use std::io::Write;
use std::thread;

use colored::Colorize;
use relay_transport::{Event, Reporter};

/// Run `work` on a worker thread and print its events as they arrive.
///
/// Status lines go to stdout, progress is redrawn in place on stderr. With
/// `quiet` the events are drained without printing.
pub fn with_progress<T, F>(quiet: bool, work: F) -> T
where
    F: FnOnce(&Reporter) -> T + Send,
    T: Send,
{
    let (reporter, events) = Reporter::channel();
    thread::scope(|scope| {
        let worker = scope.spawn(move || work(&reporter));

        let mut printer = EventPrinter::default();
        for event in events {
            if !quiet {
                printer.print(&event);
            }
        }
        printer.finish();

        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}

#[derive(Default)]
struct EventPrinter {
    progress_shown: bool,
}

impl EventPrinter {
    fn print(&mut self, event: &Event) {
        match event {
            Event::Status { message } => {
                self.finish();
                println!("{} {message}", "»".cyan());
            }
            Event::Progress { completed, total } => {
                eprint!("\r  {}", format!("{completed}/{total}").bright_black());
                let _ = std::io::stderr().flush();
                self.progress_shown = true;
            }
        }
    }

    fn finish(&mut self) {
        if self.progress_shown {
            eprintln!();
            self.progress_shown = false;
        }
    }
}
