pub mod cash;
pub mod init;
pub mod ious;
pub mod issue;
pub mod peers;
pub mod self_issue_cash;
pub mod settle;
pub mod transfer;
pub mod whoami;
