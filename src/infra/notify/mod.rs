pub mod http_notifier;
