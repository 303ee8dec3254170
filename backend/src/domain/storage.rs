/// Content storage port
use super::base::DomainResult;
use super::content::Fields;
use super::value_objects::{LanguageCode, VersionId};
use std::fmt::Debug;

/// Content storage bound to one page.
///
/// Content is addressed by (version, language) slot. Reading a slot that was
/// never written yields an empty field map; writing fully replaces the slot.
/// All methods take `&self`: implementations own their interior mutability.
pub trait Storage: Debug {
    /// Short backend name used in log output
    fn kind(&self) -> &'static str;

    fn read(&self, version: VersionId, language: &LanguageCode) -> DomainResult<Fields>;

    fn write(&self, version: VersionId, language: &LanguageCode, fields: &Fields) -> DomainResult<()>;

    fn exists(&self, version: VersionId, language: &LanguageCode) -> DomainResult<bool>;

    /// Removes one slot; deleting a missing slot is not an error
    fn delete(&self, version: VersionId, language: &LanguageCode) -> DomainResult<()>;

    /// All slots that currently hold content
    fn slots(&self) -> DomainResult<Vec<(VersionId, LanguageCode)>>;

    /// A second handle to the same underlying content
    fn boxed_clone(&self) -> Box<dyn Storage>;

    /// Copies every existing slot into `to`
    fn copy_all(&self, to: &dyn Storage) -> DomainResult<()> {
        for (version, language) in self.slots()? {
            let fields = self.read(version, &language)?;
            to.write(version, &language, &fields)?;
        }
        Ok(())
    }

    fn delete_all(&self) -> DomainResult<()> {
        for (version, language) in self.slots()? {
            self.delete(version, &language)?;
        }
        Ok(())
    }
}
