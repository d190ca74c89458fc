use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};
use env_logger::{Env, Target};

/// Log sink that writes every line to stderr and to `scraping_<date>.log`,
/// switching files when the local date changes.
pub struct DailyLogWriter {
    dir: PathBuf,
    date: NaiveDate,
    file: File,
}

impl DailyLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let date = Local::now().date_naive();
        let file = open_log_file(&dir, date)?;

        Ok(DailyLogWriter { dir, date, file })
    }

    pub fn current_path(&self) -> PathBuf {
        log_file_path(&self.dir, self.date)
    }

    fn rotate_if_needed(&mut self) -> io::Result<()> {
        let today = Local::now().date_naive();
        if today != self.date {
            self.file = open_log_file(&self.dir, today)?;
            self.date = today;
        }
        Ok(())
    }
}

impl Write for DailyLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.rotate_if_needed()?;
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("scraping_{}.log", date.format("%Y-%m-%d")))
}

fn open_log_file(dir: &Path, date: NaiveDate) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(dir, date))
}

pub fn init_logging(log_dir: &Path) -> anyhow::Result<PathBuf> {
    let writer = DailyLogWriter::new(log_dir)?;
    let path = writer.current_path();

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(writer)))
        .try_init()?;

    log::info!("Log file ready: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DailyLogWriter::new(dir.path().join("logs")).unwrap();

        writeln!(writer, "hello").unwrap();
        writer.flush().unwrap();

        let path = writer.current_path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("scraping_"));
        assert!(name.ends_with(".log"));
        assert_eq!(fs::read_to_string(path).unwrap(), "hello\n");
    }
}
