use std::ffi::{c_void, OsString};
use std::mem::MaybeUninit;
use std::ops::Deref;
use std::os::windows::prelude::OsStringExt;

use windows as Windows;
use Windows::core::{Interface, IntoParam, Param};
use Windows::Win32::Foundation::PWSTR;
use Windows::Win32::Globalization::{GetUserDefaultLocaleName, LCIDToLocaleName, LocaleNameToLCID};
use Windows::Win32::System::Com::CoTaskMemFree;
use Windows::Win32::System::SystemServices::LOCALE_NAME_MAX_LENGTH;

use crate::{Locale, Result};

pub unsafe fn from_wide(s: &PWSTR) -> OsString {
    let len = (0..).take_while(|&i| *s.0.offset(i) != 0).count();
    let slice = std::slice::from_raw_parts(s.0, len);
    OsString::from_wide(slice)
}

pub fn opt_str_param<'p, S: AsRef<str>>(opt: Option<S>) -> Param<'p, PWSTR> {
    match opt {
        Some(s) => s.as_ref().into_param(),
        None => Param::None,
    }
}

pub unsafe fn out_to_ret<T, F: FnOnce(*mut T) -> Windows::core::Result<()>>(f: F) -> Result<T> {
    let mut result = MaybeUninit::uninit();
    f(result.as_mut_ptr())?;
    Ok(result.assume_init())
}

pub unsafe fn next_obj<I: Interface, R: Interface>(
    intf: &I,
    f: unsafe fn(&I, u32, *mut Option<R>, *mut u32) -> Windows::core::Result<()>,
) -> Result<Option<R>> {
    let mut result = MaybeUninit::uninit();
    let mut fetched = MaybeUninit::uninit();
    f(intf, 1, result.as_mut_ptr(), fetched.as_mut_ptr())?;
    Ok(if fetched.assume_init() > 0 {
        result.assume_init()
    } else {
        None
    })
}

/// A string allocated by COM, freed when dropped.
pub struct ComString(PWSTR);

impl ComString {
    pub unsafe fn from_raw(ptr: PWSTR) -> Self {
        ComString(ptr)
    }

    pub fn to_string_lossy(&self) -> String {
        unsafe { from_wide(&self.0) }.to_string_lossy().into_owned()
    }
}

impl Deref for ComString {
    type Target = PWSTR;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for ComString {
    fn drop(&mut self) {
        unsafe { CoTaskMemFree(self.0 .0 as *const c_void) }
    }
}

fn locale_from_buffer(buffer: &mut [u16], len: i32) -> Option<Locale> {
    if len <= 1 {
        return None;
    }
    let name = unsafe { from_wide(&PWSTR(&mut buffer[0])) };
    name.to_str()?.parse().ok()
}

/// Converts a Windows locale identifier, as found in SAPI voice attributes, to a locale.
pub fn lcid_to_locale(lcid: u32) -> Option<Locale> {
    let mut buffer: [u16; LOCALE_NAME_MAX_LENGTH as _] = [0; LOCALE_NAME_MAX_LENGTH as _];
    let len = unsafe {
        LCIDToLocaleName(lcid, PWSTR(&mut buffer[0]), LOCALE_NAME_MAX_LENGTH as _, 0)
    };
    locale_from_buffer(&mut buffer, len)
}

/// Converts a locale to the Windows locale identifier SAPI uses to select voices.
pub fn locale_to_lcid(locale: &Locale) -> Option<u32> {
    let name = match locale.region() {
        Some(region) => format!("{}-{}", locale.language(), region),
        None => locale.language().to_string(),
    };
    match unsafe { LocaleNameToLCID(name.as_str(), 0) } {
        0 => None,
        lcid => Some(lcid),
    }
}

pub fn user_default_locale() -> Option<Locale> {
    let mut buffer: [u16; LOCALE_NAME_MAX_LENGTH as _] = [0; LOCALE_NAME_MAX_LENGTH as _];
    let len =
        unsafe { GetUserDefaultLocaleName(PWSTR(&mut buffer[0]), LOCALE_NAME_MAX_LENGTH as _) };
    locale_from_buffer(&mut buffer, len)
}
