use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PosError {
    #[error("please answer \"{0}\"")] MissingAnswer(String),
    #[error("the customization window is already closed")] ModalClosed,
    #[error("no prompt at position {0}")] NoSuchPrompt(usize),
    #[error("prompt \"{0}\" does not accept this kind of answer")] KindMismatch(String),
    #[error("\"{1}\" is not a choice of prompt \"{0}\"")] UnknownChoice(String, String),
    #[error("config error: {0}")] Config(String),
}
