/*
 * Responsibility
 * - Negotiate challenge で運ばれる token 文字列 ↔ バイト列の変換
 * - 入力は hex (符号付き big integer) を先に試し、だめなら標準 Base64
 * - 出力は常に改行なしの標準 Base64
 *
 * thiserror を使わない理由:
 * - エラーは AuthError::MalformedToken に集約するので独自型を持たない
 */
use base64::{Engine as _, engine::general_purpose::STANDARD};
use num_bigint_dig::BigInt;

use crate::services::auth::error::AuthError;

/// Token 文字列をバイト列へ。
///
/// hex の場合は符号付き big integer として解釈し、最小の
/// two's-complement big-endian 表現を取る (`"ff"` → `[0x00, 0xFF]`)。
/// hex として読めなければ標準 Base64 にフォールバックする。
/// 全て hex 文字の Base64 文字列は hex として解釈される点に注意
/// (hex 優先はプロトコル互換のための仕様)。
pub fn decode(token: &str) -> Result<Vec<u8>, AuthError> {
    if let Some(n) = BigInt::parse_bytes(token.as_bytes(), 16) {
        return Ok(n.to_signed_bytes_be());
    }
    STANDARD
        .decode(token)
        .map_err(|e| AuthError::MalformedToken(e.into()))
}

/// 出力 token は常に標準 Base64 (改行なし)。空入力は空文字列。
pub fn encode(token: &[u8]) -> String {
    STANDARD.encode(token)
}
