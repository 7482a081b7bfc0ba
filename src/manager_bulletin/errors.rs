use thiserror::Error;

#[derive(Error, Debug)]
#[error("error fetching bulletin: {0}")]
pub struct BulletinError(pub String);
impl From<suppaftp::FtpError> for BulletinError {
    fn from(e: suppaftp::FtpError) -> BulletinError {
        BulletinError(format!("ftp error: {}", e))
    }
}
impl From<std::string::FromUtf8Error> for BulletinError {
    fn from(e: std::string::FromUtf8Error) -> BulletinError {
        BulletinError(format!("bulletin is not valid utf-8: {}", e))
    }
}
