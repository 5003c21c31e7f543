use std::{borrow::Cow, fmt::Display};

use crate::OrdpathErr;

/// Coarse outcome of a codec operation, with stable numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Success = 0,
    InternalError = 1,
    OutOfMemory = 2,
    Invalid = 3,
    SetupParse = 10,
    SetupInvalid = 11,
    SetupLimit = 12,
    CorruptData = 20,
}

impl Status {
    const ALL: [Status; 8] = [
        Status::Success,
        Status::InternalError,
        Status::OutOfMemory,
        Status::Invalid,
        Status::SetupParse,
        Status::SetupInvalid,
        Status::SetupLimit,
        Status::CorruptData,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| i32::from(s.code()) == code)
    }

    /// Human readable description of this status.
    pub fn message(self) -> &'static str {
        match self {
            Status::Success => "Success",
            Status::InternalError => "Internal error",
            Status::OutOfMemory => "Out of memory",
            Status::Invalid => "Invalid parameter",
            Status::SetupParse => "Unable to parse setup",
            Status::SetupInvalid => "Invalid setup",
            Status::SetupLimit => "Setup rejected due to internal limits",
            Status::CorruptData => "Data corruption detected",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<&OrdpathErr> for Status {
    fn from(err: &OrdpathErr) -> Self {
        match err {
            OrdpathErr::Internal => Status::InternalError,
            OrdpathErr::OutOfMemory => Status::OutOfMemory,
            OrdpathErr::Invalid(_) => Status::Invalid,
            OrdpathErr::SetupParse { .. } => Status::SetupParse,
            OrdpathErr::SetupInvalid(_) => Status::SetupInvalid,
            OrdpathErr::SetupLimit(_) => Status::SetupLimit,
            OrdpathErr::CorruptData { .. } => Status::CorruptData,
        }
    }
}

impl<T> From<&Result<T, OrdpathErr>> for Status {
    fn from(result: &Result<T, OrdpathErr>) -> Self {
        result.as_ref().map_or_else(Status::from, |_| Status::Success)
    }
}

/// Describe a raw status code, including codes this crate does not know.
pub fn strerror(code: i32) -> Cow<'static, str> {
    match Status::from_code(code) {
        Some(status) => Cow::Borrowed(status.message()),
        None => Cow::Owned(format!("Unknown error {code}")),
    }
}

#[cfg(test)]
mod tests {
    use crate::{InvalidParam, LimitViolation, OrdpathErr, SetupViolation, Status, strerror};

    #[test]
    fn test_status_codes_roundtrip() {
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code().into()), Some(status));
        }
        assert_eq!(Status::from_code(4), None);
        assert_eq!(Status::from_code(-1), None);
    }

    #[test]
    fn test_strerror() {
        assert_eq!(strerror(0), "Success");
        assert_eq!(strerror(11), "Invalid setup");
        assert_eq!(strerror(12), "Setup rejected due to internal limits");
        assert_eq!(strerror(20), "Data corruption detected");
        assert_eq!(strerror(42), "Unknown error 42");
    }

    #[test]
    fn test_error_status() {
        let cases = [
            (OrdpathErr::Internal, Status::InternalError),
            (OrdpathErr::OutOfMemory, Status::OutOfMemory),
            (InvalidParam::Misaligned.into(), Status::Invalid),
            (OrdpathErr::SetupParse { offset: 3 }, Status::SetupParse),
            (SetupViolation::MissingOrigin.into(), Status::SetupInvalid),
            (LimitViolation::TooManyIntervals.into(), Status::SetupLimit),
            (OrdpathErr::CorruptData { decoded: 1 }, Status::CorruptData),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }

        let ok: Result<(), OrdpathErr> = Ok(());
        assert_eq!(Status::from(&ok), Status::Success);
    }
}
