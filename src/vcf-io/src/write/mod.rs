use std::{fs::File, io::{self, BufWriter, Seek, SeekFrom, Write}, path::{Path, PathBuf}};

use ahash::AHashSet;
use gzp::{deflate::Bgzf, par::compress::{ParCompress, ParCompressBuilder}, ZWriter};
use log::debug;

use located_error::prelude::*;
use variant::{Symbols, VariantRecord};

use crate::{header::VcfHeader, parse::create_parent_directory};

mod error;
pub use error::VcfWriterError;

/// Final destination of a VCF: plain text or BGZF, depending on the output file extension.
enum Output {
    Plain(BufWriter<File>),
    Bgzf(ParCompress<Bgzf>),
}

impl Output {
    fn create(path: &Path, threads: usize) -> Result<Self> {
        use VcfWriterError::{CreateOutput, Compress};
        let file = File::create(path).map_err(CreateOutput).with_loc(|| format!("While creating {}", path.display()))?;
        let is_gz = path.extension().map_or(false, |ext| ext == "gz");
        Ok(match is_gz {
            true  => {
                let writer = ParCompressBuilder::<Bgzf>::new()
                    .num_threads(threads.max(1))
                    .map_err(Compress)
                    .loc("While setting up BGZF compression")?
                    .from_writer(file);
                Self::Bgzf(writer)
            },
            false => Self::Plain(BufWriter::new(file)),
        })
    }

    fn finish(self) -> Result<()> {
        use VcfWriterError::{Assemble, Compress};
        match self {
            Self::Plain(mut writer) => writer.flush().map_err(Assemble).loc("While flushing output VCF"),
            Self::Bgzf(mut writer)  => writer.finish().map_err(Compress).loc("While flushing output VCF"),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(writer) => writer.write(buf),
            Self::Bgzf(writer)  => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(writer) => writer.flush(),
            Self::Bgzf(writer)  => writer.flush(),
        }
    }
}

/// VCF writer with a deferred header.
///
/// Records are streamed into an anonymous temporary file located next to the output. The header
/// is only written once every record is known, so that `##contig` lines of sequences without any
/// surviving record may be removed.
pub struct VcfWriter {
    path   : PathBuf,
    body   : BufWriter<File>,
    symbols: Symbols,
    contigs: AHashSet<String>,
    records: usize,
    threads: usize,
}

impl VcfWriter {
    /// # Arguments
    /// - `path`   : output file. A `.gz` extension triggers BGZF compression.
    /// - `symbols`: reserved imputed-md / missing symbols used to render rewritten calls.
    /// - `threads`: number of compression threads (only relevant for `.gz` outputs)
    pub fn new(path: &Path, symbols: Symbols, threads: usize) -> Result<Self> {
        use VcfWriterError::CreateBody;
        create_parent_directory(path)?;
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let body = tempfile::tempfile_in(parent)
            .map_err(CreateBody)
            .with_loc(|| format!("While preparing output file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            body: BufWriter::new(body),
            symbols,
            contigs: AHashSet::new(),
            records: 0,
            threads,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_record(&mut self, record: &VariantRecord) -> Result<()> {
        use VcfWriterError::WriteRecord;
        if !self.contigs.contains(&record.chrom) {
            self.contigs.insert(record.chrom.clone());
        }
        writeln!(self.body, "{}", record.render(&self.symbols))
            .map_err(WriteRecord)
            .with_loc(|| format!("While writing record {}", record.key()))?;
        self.records += 1;
        Ok(())
    }

    /// Write `header` (minus unused `##contig` lines), followed by every record, into the output file.
    ///
    /// Returns the number of written records.
    pub fn finish(self, header: &VcfHeader) -> Result<usize> {
        use VcfWriterError::Assemble;
        let loc_msg = || format!("While assembling {}", self.path.display());

        let mut header = header.clone();
        let removed = header.retain_contigs(&self.contigs);
        if removed > 0 {
            debug!("Removed {removed} unused ##contig line(s) from the header of {}", self.path.display());
        }

        let mut body = self.body.into_inner()
            .map_err(|e| Assemble(e.into_error()))
            .with_loc(loc_msg)?;
        body.seek(SeekFrom::Start(0)).map_err(Assemble).with_loc(loc_msg)?;

        let mut output = Output::create(&self.path, self.threads).with_loc(loc_msg)?;
        output.write_all(header.render().as_bytes()).map_err(Assemble).with_loc(loc_msg)?;
        io::copy(&mut body, &mut output).map_err(Assemble).with_loc(loc_msg)?;
        output.finish().with_loc(loc_msg)?;
        Ok(self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VcfReader;
    use pretty_assertions::assert_eq;
    use variant::Genotype;

    const INPUT: &str = "\
    ##fileformat=VCFv4.2\n\
    ##contig=<ID=seq1,length=500>\n\
    ##contig=<ID=seq2,length=500>\n\
    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tM1\tA1\n\
    seq1\t100\t.\tA\tT\t50\tPASS\tDP=50\tGT:DP\t0/0:3\t./.:0\n\
    seq2\t10\t.\tC\tG\t50\tPASS\tDP=20\tGT\t1/1\t0/1\n\
    ";

    #[test]
    fn deferred_header_drops_unused_contigs() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let input = tmpdir.path().join("input.vcf");
        std::fs::write(&input, INPUT)?;
        let output = tmpdir.path().join("out").join("output.vcf");

        let mut reader = VcfReader::new(&input, 0, Symbols::default())?;
        let header = reader.header().clone();
        let mut writer = VcfWriter::new(&output, Symbols::default(), 1)?;
        let mut first = reader.next_record()?.expect("first record");
        first.set_genotype(1, Genotype::IMPUTED)?;
        writer.write_record(&first)?;
        assert_eq!(writer.finish(&header)?, 1);

        let got = std::fs::read_to_string(&output)?;
        assert_eq!(got, "\
        ##fileformat=VCFv4.2\n\
        ##contig=<ID=seq1,length=500>\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tM1\tA1\n\
        seq1\t100\t.\tA\tT\t50\tPASS\tDP=50\tGT:DP\t0/0:3\t99/99:0\n\
        ");
        Ok(())
    }

    #[test]
    fn bgzf_output_reads_back() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let input = tmpdir.path().join("input.vcf");
        std::fs::write(&input, INPUT)?;
        let output = tmpdir.path().join("output.vcf.gz");

        let reader = VcfReader::new(&input, 0, Symbols::default())?;
        let header = reader.header().clone();
        let mut writer = VcfWriter::new(&output, Symbols::default(), 2)?;
        for record in reader {
            writer.write_record(&record?)?;
        }
        assert_eq!(writer.finish(&header)?, 2);

        let reread = VcfReader::new(&output, 1, Symbols::default())?;
        assert_eq!(reread.header().contigs().count(), 2);
        let keys = reread.map(|r| r.map(|r| r.key())).collect::<Result<Vec<_>>>()?;
        assert_eq!(keys, ["seq1:100", "seq2:10"]);
        Ok(())
    }
}
