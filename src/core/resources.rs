use crate::domain::ports::ResourceBlobSettings;
use crate::utils::error::{Result, UpdaterError};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// 解密（AES-CBC / PKCS#7）後再 gunzip
pub fn decrypt_resource_blob(blob: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let compressed = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .decrypt_padded_vec_mut::<Pkcs7>(blob),
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .decrypt_padded_vec_mut::<Pkcs7>(blob),
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .decrypt_padded_vec_mut::<Pkcs7>(blob),
        n => {
            return Err(UpdaterError::DecryptError {
                message: format!("Unsupported AES key length: {} bytes", n),
            })
        }
    }
    .map_err(|_| UpdaterError::DecryptError {
        message: "Bad padding, wrong key or IV".to_string(),
    })?;

    let mut output = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut output)
        .map_err(|e| UpdaterError::DecryptError {
            message: format!("Decrypted payload is not gzip data: {}", e),
        })?;
    Ok(output)
}

/// 將資源檔解密寫到 `<cache_dir>/res.apk`，回傳寫入的路徑
pub async fn load_resources(settings: &ResourceBlobSettings, cache_dir: &Path) -> Result<PathBuf> {
    let key = decode_hex("resources.key", &settings.key_hex)?;
    let iv = decode_hex("resources.iv", &settings.iv_hex)?;

    let blob = tokio::fs::read(&settings.path).await?;
    let resources = decrypt_resource_blob(&blob, &key, &iv)?;

    tokio::fs::create_dir_all(cache_dir).await?;
    let target = cache_dir.join("res.apk");
    tokio::fs::write(&target, &resources).await?;

    tracing::debug!(
        "Decrypted {} bytes of resources into {}",
        resources.len(),
        target.display()
    );
    Ok(target)
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim()).map_err(|e| UpdaterError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: format!("Invalid hex: {}", e),
    })
}

fn invalid_length(_: aes::cipher::InvalidLength) -> UpdaterError {
    UpdaterError::DecryptError {
        message: "IV must be 16 bytes".to_string(),
    }
}
