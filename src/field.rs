use std::fmt;

/// Wire-visible field names written by the encoder.
///
/// The strings are part of the output contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    TimeStamp,
    Level,
    Message,
    Exception,
    Class,
    File,
    LineNumber,
    Function,
}

impl FieldName {
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldName::TimeStamp => "TimeStamp",
            FieldName::Level => "Level",
            FieldName::Message => "Message",
            FieldName::Exception => "Exception",
            FieldName::Class => "Class",
            FieldName::File => "File",
            FieldName::LineNumber => "LineNumber",
            FieldName::Function => "Function",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
