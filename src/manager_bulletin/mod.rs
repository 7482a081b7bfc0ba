pub mod errors;

use log::{info, warn};
use suppaftp::FtpStream;
use crate::config::Bulletin;
use crate::ingestion::BulletinFetcher;
use crate::manager_bulletin::errors::BulletinError;

/// Struct for retrieving the text bulletin from the BoM anonymous FTP server
pub struct BoMBulletin {
    host: String,
    port: u16,
    dir: String,
    file_name: String,
}

impl BoMBulletin {
    /// Returns a new instance of the BoMBulletin struct
    ///
    /// # Arguments
    ///
    /// * 'config' - bulletin configuration
    pub fn new(config: &Bulletin) -> Result<Self, BulletinError> {
        if config.file_name.is_empty() {
            return Err(BulletinError("no bulletin file name given".to_string()));
        }

        Ok(Self {
            host: config.ftp_host.to_string(),
            port: config.ftp_port,
            dir: config.ftp_dir.to_string(),
            file_name: config.file_name.to_string(),
        })
    }

    /// Downloads the bulletin file over anonymous FTP and decodes it as UTF-8
    ///
    fn download(&self) -> Result<String, BulletinError> {
        info!("Connecting to FTP server: {}", self.host);
        let mut ftp = FtpStream::connect(format!("{}:{}", self.host, self.port))?;
        ftp.login("anonymous", "anonymous@")?;
        ftp.cwd(&self.dir)?;

        let buffer = ftp.retr_as_buffer(&self.file_name)?;
        close_session(ftp);

        let text = String::from_utf8(buffer.into_inner())?;
        info!("Successfully downloaded {}", self.file_name);

        Ok(text)
    }
}

/// Ends the FTP session. The file is already retrieved at this point, so a failing QUIT is
/// only logged.
///
/// # Arguments
///
/// * 'ftp' - the open session
fn close_session(mut ftp: FtpStream) {
    if let Err(e) = ftp.quit() {
        warn!("Failed to close FTP session: {}", e);
    }
}

impl BulletinFetcher for BoMBulletin {
    type Error = BulletinError;

    fn fetch(&self) -> Result<String, BulletinError> {
        self.download()
    }
}
