//! The foreign surface of the qpdf C API consumed by [`crate::NativeDocumentSession`].
//!
//! [`QpdfApi`] is the seam between the session state machine and the loaded
//! library. [`crate::QpdfLibrary`] implements it over the real shared object;
//! tests implement it in-process.

use crate::error::NativeError;
use std::ffi::{c_int, c_void, CStr};
use std::ptr::NonNull;

/// Return value of qpdf calls that report success/warnings/errors as bit flags.
pub type ReturnStatus = c_int;

/// `QPDF_SUCCESS`
pub const QPDF_SUCCESS: ReturnStatus = 0;
/// `QPDF_WARNINGS`
pub const QPDF_WARNINGS: ReturnStatus = 1 << 0;
/// `QPDF_ERRORS`
pub const QPDF_ERRORS: ReturnStatus = 1 << 1;

/// Opaque `qpdf_data` pointer.
///
/// A handle is only meaningful to the [`QpdfApi`] implementation that
/// produced it via [`QpdfApi::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextHandle(NonNull<c_void>);

impl ContextHandle {
    pub fn new(ptr: NonNull<c_void>) -> Self {
        Self(ptr)
    }

    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// `enum qpdf_object_stream_e`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectStreamMode {
    Disable = 0,
    Preserve = 1,
    #[default]
    Generate = 2,
}

/// `enum qpdf_r3_print_e`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintLevel {
    Full = 0,
    Low = 1,
    None = 2,
}

/// `enum qpdf_r3_modify_e`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyLevel {
    All = 0,
    Annotate = 1,
    Form = 2,
    Assembly = 3,
    None = 4,
}

/// Arguments of `qpdf_set_r6_encryption_parameters` (AES-256).
#[derive(Debug, Clone, Copy)]
pub struct R6Parameters<'a> {
    pub user_password: &'a CStr,
    pub owner_password: &'a CStr,
    /// Ignored by qpdf for R6; always passed as allowed.
    pub allow_accessibility: bool,
    pub allow_extract: bool,
    pub print: PrintLevel,
    pub modify: ModifyLevel,
    pub encrypt_metadata: bool,
}

/// The subset of the qpdf C API used by a document session.
///
/// Implementations receive only handles they returned from [`QpdfApi::init`]
/// and that have not yet been passed to [`QpdfApi::cleanup`]; the session
/// enforces this.
pub trait QpdfApi {
    /// `qpdf_get_qpdf_version`
    fn version(&self) -> String;

    /// `qpdf_init`. `None` if the library could not allocate a context.
    fn init(&self) -> Option<ContextHandle>;

    /// `qpdf_cleanup`. Called exactly once per handle.
    fn cleanup(&self, ctx: ContextHandle);

    /// `qpdf_has_error`
    fn has_error(&self, ctx: ContextHandle) -> bool;

    /// `qpdf_get_error` + `qpdf_get_error_code` + `qpdf_get_error_full_text`.
    ///
    /// Retrieving the error clears it in the native context.
    fn take_error(&self, ctx: ContextHandle) -> Option<NativeError>;

    /// `qpdf_more_warnings` + `qpdf_next_warning`, drained.
    fn take_warnings(&self, ctx: ContextHandle) -> Vec<String>;

    /// `qpdf_read`
    fn read(&self, ctx: ContextHandle, path: &CStr, password: Option<&CStr>) -> ReturnStatus;

    /// `qpdf_read_memory`
    ///
    /// # Safety
    /// The library keeps referring to `buffer` after the call returns:
    /// it must stay alive and unmoved until `cleanup(ctx)`.
    unsafe fn read_memory(
        &self,
        ctx: ContextHandle,
        description: &CStr,
        buffer: &[u8],
        password: Option<&CStr>,
    ) -> ReturnStatus;

    /// `qpdf_is_encrypted`
    fn is_encrypted(&self, ctx: ContextHandle) -> bool;

    /// `qpdf_init_write`
    fn init_write(&self, ctx: ContextHandle, path: &CStr) -> ReturnStatus;

    /// `qpdf_init_write_memory`
    fn init_write_memory(&self, ctx: ContextHandle) -> ReturnStatus;

    /// `qpdf_get_buffer_length` + `qpdf_get_buffer`, copied out.
    fn take_buffer(&self, ctx: ContextHandle) -> Vec<u8>;

    /// `qpdf_set_object_stream_mode`
    fn set_object_stream_mode(&self, ctx: ContextHandle, mode: ObjectStreamMode);

    /// `qpdf_set_qdf_mode`
    fn set_qdf_mode(&self, ctx: ContextHandle, enabled: bool);

    /// `qpdf_set_compress_streams`
    fn set_compress_streams(&self, ctx: ContextHandle, enabled: bool);

    /// `qpdf_set_newline_before_endstream`
    fn set_newline_before_endstream(&self, ctx: ContextHandle, enabled: bool);

    /// `qpdf_set_preserve_encryption`
    fn set_preserve_encryption(&self, ctx: ContextHandle, enabled: bool);

    /// `qpdf_set_r6_encryption_parameters`
    fn set_r6_encryption_parameters(&self, ctx: ContextHandle, params: &R6Parameters<'_>);

    /// `qpdf_write`
    fn write(&self, ctx: ContextHandle) -> ReturnStatus;
}

impl<T: QpdfApi + ?Sized> QpdfApi for std::sync::Arc<T> {
    fn version(&self) -> String {
        (**self).version()
    }
    fn init(&self) -> Option<ContextHandle> {
        (**self).init()
    }
    fn cleanup(&self, ctx: ContextHandle) {
        (**self).cleanup(ctx)
    }
    fn has_error(&self, ctx: ContextHandle) -> bool {
        (**self).has_error(ctx)
    }
    fn take_error(&self, ctx: ContextHandle) -> Option<NativeError> {
        (**self).take_error(ctx)
    }
    fn take_warnings(&self, ctx: ContextHandle) -> Vec<String> {
        (**self).take_warnings(ctx)
    }
    fn read(&self, ctx: ContextHandle, path: &CStr, password: Option<&CStr>) -> ReturnStatus {
        (**self).read(ctx, path, password)
    }
    unsafe fn read_memory(
        &self,
        ctx: ContextHandle,
        description: &CStr,
        buffer: &[u8],
        password: Option<&CStr>,
    ) -> ReturnStatus {
        unsafe { (**self).read_memory(ctx, description, buffer, password) }
    }
    fn is_encrypted(&self, ctx: ContextHandle) -> bool {
        (**self).is_encrypted(ctx)
    }
    fn init_write(&self, ctx: ContextHandle, path: &CStr) -> ReturnStatus {
        (**self).init_write(ctx, path)
    }
    fn init_write_memory(&self, ctx: ContextHandle) -> ReturnStatus {
        (**self).init_write_memory(ctx)
    }
    fn take_buffer(&self, ctx: ContextHandle) -> Vec<u8> {
        (**self).take_buffer(ctx)
    }
    fn set_object_stream_mode(&self, ctx: ContextHandle, mode: ObjectStreamMode) {
        (**self).set_object_stream_mode(ctx, mode)
    }
    fn set_qdf_mode(&self, ctx: ContextHandle, enabled: bool) {
        (**self).set_qdf_mode(ctx, enabled)
    }
    fn set_compress_streams(&self, ctx: ContextHandle, enabled: bool) {
        (**self).set_compress_streams(ctx, enabled)
    }
    fn set_newline_before_endstream(&self, ctx: ContextHandle, enabled: bool) {
        (**self).set_newline_before_endstream(ctx, enabled)
    }
    fn set_preserve_encryption(&self, ctx: ContextHandle, enabled: bool) {
        (**self).set_preserve_encryption(ctx, enabled)
    }
    fn set_r6_encryption_parameters(&self, ctx: ContextHandle, params: &R6Parameters<'_>) {
        (**self).set_r6_encryption_parameters(ctx, params)
    }
    fn write(&self, ctx: ContextHandle) -> ReturnStatus {
        (**self).write(ctx)
    }
}
