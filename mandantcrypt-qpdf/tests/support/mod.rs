//! In-process stand-in for the qpdf shared library.

use mandantcrypt_qpdf::bindings::{
    ContextHandle, ObjectStreamMode, QpdfApi, R6Parameters, ReturnStatus, QPDF_ERRORS,
    QPDF_SUCCESS, QPDF_WARNINGS,
};
use mandantcrypt_qpdf::{NativeError, NativeErrorCode};
use std::ffi::CStr;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init,
    Cleanup,
    Read { path: String, password: Option<String> },
    ReadMemory { description: String, len: usize, password: Option<String> },
    InitWrite(String),
    InitWriteMemory,
    ObjectStreams(ObjectStreamMode),
    QdfMode(bool),
    CompressStreams(bool),
    NewlineBeforeEndstream(bool),
    PreserveEncryption(bool),
    Encrypt { user: String, owner: String, extract: bool, metadata: bool },
    Write,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    pending_error: Option<NativeError>,
    warnings: Vec<String>,
    fail_read: Option<NativeError>,
    fail_write: Option<NativeError>,
    errors_without_detail: bool,
    warn_on_read: Vec<String>,
    fail_init: bool,
    encrypted: bool,
    // Echoed back as the written buffer.
    memory: Vec<u8>,
}

/// Records every call and fails on request.
#[derive(Default)]
pub struct FakeQpdf {
    state: Mutex<State>,
}

impl FakeQpdf {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn cleanups(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Cleanup).count()
    }

    pub fn fail_read(&self, code: NativeErrorCode, message: &str) {
        self.state.lock().unwrap().fail_read = Some(NativeError {
            code,
            message: message.to_string(),
        });
    }

    pub fn fail_write(&self, code: NativeErrorCode, message: &str) {
        self.state.lock().unwrap().fail_write = Some(NativeError {
            code,
            message: message.to_string(),
        });
    }

    /// Next failing call reports the error bit but no retrievable detail.
    pub fn errors_without_detail(&self) {
        self.state.lock().unwrap().errors_without_detail = true;
    }

    pub fn warn_on_read(&self, warning: &str) {
        self.state.lock().unwrap().warn_on_read.push(warning.to_string());
    }

    pub fn fail_init(&self) {
        self.state.lock().unwrap().fail_init = true;
    }

    pub fn set_encrypted(&self, encrypted: bool) {
        self.state.lock().unwrap().encrypted = encrypted;
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn fail(&self, err: NativeError) -> ReturnStatus {
        let mut state = self.state.lock().unwrap();
        if !state.errors_without_detail {
            state.pending_error = Some(err);
        }
        QPDF_ERRORS
    }
}

fn text(value: &CStr) -> String {
    value.to_string_lossy().into_owned()
}

impl QpdfApi for FakeQpdf {
    fn version(&self) -> String {
        "11.9.1".to_string()
    }

    fn init(&self) -> Option<ContextHandle> {
        self.record(Call::Init);
        if self.state.lock().unwrap().fail_init {
            return None;
        }
        Some(ContextHandle::new(NonNull::dangling()))
    }

    fn cleanup(&self, _ctx: ContextHandle) {
        self.record(Call::Cleanup);
    }

    fn has_error(&self, _ctx: ContextHandle) -> bool {
        self.state.lock().unwrap().pending_error.is_some()
    }

    fn take_error(&self, _ctx: ContextHandle) -> Option<NativeError> {
        self.state.lock().unwrap().pending_error.take()
    }

    fn take_warnings(&self, _ctx: ContextHandle) -> Vec<String> {
        std::mem::take(&mut self.state.lock().unwrap().warnings)
    }

    fn read(&self, _ctx: ContextHandle, path: &CStr, password: Option<&CStr>) -> ReturnStatus {
        self.record(Call::Read {
            path: text(path),
            password: password.map(text),
        });
        let failure = self.state.lock().unwrap().fail_read.take();
        if let Some(err) = failure {
            return self.fail(err);
        }
        let mut state = self.state.lock().unwrap();
        if state.warn_on_read.is_empty() {
            return QPDF_SUCCESS;
        }
        let warnings = std::mem::take(&mut state.warn_on_read);
        state.warnings.extend(warnings);
        QPDF_WARNINGS
    }

    unsafe fn read_memory(
        &self,
        _ctx: ContextHandle,
        description: &CStr,
        buffer: &[u8],
        password: Option<&CStr>,
    ) -> ReturnStatus {
        self.record(Call::ReadMemory {
            description: text(description),
            len: buffer.len(),
            password: password.map(text),
        });
        let mut state = self.state.lock().unwrap();
        state.memory = buffer.to_vec();
        let failure = state.fail_read.take();
        drop(state);
        match failure {
            Some(err) => self.fail(err),
            None => QPDF_SUCCESS,
        }
    }

    fn is_encrypted(&self, _ctx: ContextHandle) -> bool {
        self.state.lock().unwrap().encrypted
    }

    fn init_write(&self, _ctx: ContextHandle, path: &CStr) -> ReturnStatus {
        self.record(Call::InitWrite(text(path)));
        QPDF_SUCCESS
    }

    fn init_write_memory(&self, _ctx: ContextHandle) -> ReturnStatus {
        self.record(Call::InitWriteMemory);
        QPDF_SUCCESS
    }

    fn take_buffer(&self, _ctx: ContextHandle) -> Vec<u8> {
        self.state.lock().unwrap().memory.clone()
    }

    fn set_object_stream_mode(&self, _ctx: ContextHandle, mode: ObjectStreamMode) {
        self.record(Call::ObjectStreams(mode));
    }

    fn set_qdf_mode(&self, _ctx: ContextHandle, enabled: bool) {
        self.record(Call::QdfMode(enabled));
    }

    fn set_compress_streams(&self, _ctx: ContextHandle, enabled: bool) {
        self.record(Call::CompressStreams(enabled));
    }

    fn set_newline_before_endstream(&self, _ctx: ContextHandle, enabled: bool) {
        self.record(Call::NewlineBeforeEndstream(enabled));
    }

    fn set_preserve_encryption(&self, _ctx: ContextHandle, enabled: bool) {
        self.record(Call::PreserveEncryption(enabled));
    }

    fn set_r6_encryption_parameters(&self, _ctx: ContextHandle, params: &R6Parameters<'_>) {
        self.record(Call::Encrypt {
            user: text(params.user_password),
            owner: text(params.owner_password),
            extract: params.allow_extract,
            metadata: params.encrypt_metadata,
        });
    }

    fn write(&self, _ctx: ContextHandle) -> ReturnStatus {
        self.record(Call::Write);
        let failure = self.state.lock().unwrap().fail_write.take();
        match failure {
            Some(err) => self.fail(err),
            None => QPDF_SUCCESS,
        }
    }
}
